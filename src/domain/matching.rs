//! Order Compatibility - Client-Side Replica of the Hub's Match Rules
//!
//! The hub is authoritative. These checks exist so a mismatched tuple fails
//! with a readable reason before a transaction is paid for.
//!
//! Restrictions are compared as plain addresses. A restriction pointing at a
//! group contract will be reported as a mismatch here even if the hub would
//! accept it.

use alloy::primitives::{Address, B256};

use super::errors::{SdkError, SdkResult};
use super::order::{AppOrder, DatasetOrder, RequestOrder, TAG_TEE, WorkerpoolOrder};

/// The four orders of one match; the dataset order may be [`DatasetOrder::empty`].
#[derive(Debug, Clone, Copy)]
pub struct OrderTuple<'a> {
    pub app: &'a AppOrder,
    pub dataset: &'a DatasetOrder,
    pub workerpool: &'a WorkerpoolOrder,
    pub request: &'a RequestOrder,
}

fn restriction_ok(restrict: Address, candidate: Address) -> bool {
    restrict.is_zero() || restrict == candidate
}

fn tag_or(a: B256, b: B256) -> B256 {
    a | b
}

/// Every reason the tuple would be rejected, in a stable order.
pub fn incompatibilities(orders: OrderTuple<'_>) -> Vec<String> {
    let OrderTuple { app, dataset, workerpool, request } = orders;
    let mut issues = Vec::new();
    let mut check = |ok: bool, reason: String| {
        if !ok {
            issues.push(reason);
        }
    };

    check(app.volume > 0, "apporder volume is zero".into());
    check(workerpool.volume > 0, "workerpoolorder volume is zero".into());
    check(request.volume > 0, "requestorder volume is zero".into());

    check(
        request.app == app.app,
        format!("requestorder app {} does not match apporder app {}", request.app, app.app),
    );
    check(
        restriction_ok(request.workerpool, workerpool.workerpool),
        format!(
            "requestorder workerpool {} does not match workerpoolorder workerpool {}",
            request.workerpool, workerpool.workerpool
        ),
    );
    check(
        request.category == workerpool.category,
        format!(
            "requestorder category {} differs from workerpoolorder category {}",
            request.category, workerpool.category
        ),
    );
    check(
        request.trust <= workerpool.trust,
        format!(
            "requestorder trust {} exceeds workerpoolorder trust {}",
            request.trust, workerpool.trust
        ),
    );
    check(
        app.appprice <= request.appmaxprice,
        format!("appprice {} exceeds appmaxprice {}", app.appprice, request.appmaxprice),
    );
    check(
        workerpool.workerpoolprice <= request.workerpoolmaxprice,
        format!(
            "workerpoolprice {} exceeds workerpoolmaxprice {}",
            workerpool.workerpoolprice, request.workerpoolmaxprice
        ),
    );

    let combined = if dataset.is_empty() {
        tag_or(app.tag, request.tag)
    } else {
        tag_or(tag_or(app.tag, dataset.tag), request.tag)
    };
    check(
        (combined & !workerpool.tag).is_zero(),
        format!("workerpoolorder tag {} does not cover required tag {combined}", workerpool.tag),
    );
    check(
        (combined[31] ^ app.tag[31]) & TAG_TEE == 0,
        "TEE tag requested but the apporder is not tagged TEE".into(),
    );

    check(
        restriction_ok(app.workerpoolrestrict, workerpool.workerpool),
        format!("apporder is restricted to workerpool {}", app.workerpoolrestrict),
    );
    check(
        restriction_ok(app.requesterrestrict, request.requester),
        format!("apporder is restricted to requester {}", app.requesterrestrict),
    );
    check(
        restriction_ok(workerpool.apprestrict, app.app),
        format!("workerpoolorder is restricted to app {}", workerpool.apprestrict),
    );
    check(
        restriction_ok(workerpool.requesterrestrict, request.requester),
        format!("workerpoolorder is restricted to requester {}", workerpool.requesterrestrict),
    );

    if dataset.is_empty() {
        check(
            request.dataset.is_zero(),
            format!("requestorder expects dataset {} but no datasetorder was given", request.dataset),
        );
    } else {
        check(dataset.volume > 0, "datasetorder volume is zero".into());
        check(
            request.dataset == dataset.dataset,
            format!(
                "requestorder dataset {} does not match datasetorder dataset {}",
                request.dataset, dataset.dataset
            ),
        );
        check(
            dataset.datasetprice <= request.datasetmaxprice,
            format!(
                "datasetprice {} exceeds datasetmaxprice {}",
                dataset.datasetprice, request.datasetmaxprice
            ),
        );
        check(
            restriction_ok(app.datasetrestrict, dataset.dataset),
            format!("apporder is restricted to dataset {}", app.datasetrestrict),
        );
        check(
            restriction_ok(dataset.apprestrict, app.app),
            format!("datasetorder is restricted to app {}", dataset.apprestrict),
        );
        check(
            restriction_ok(dataset.workerpoolrestrict, workerpool.workerpool),
            format!("datasetorder is restricted to workerpool {}", dataset.workerpoolrestrict),
        );
        check(
            restriction_ok(dataset.requesterrestrict, request.requester),
            format!("datasetorder is restricted to requester {}", dataset.requesterrestrict),
        );
        check(
            restriction_ok(workerpool.datasetrestrict, dataset.dataset),
            format!("workerpoolorder is restricted to dataset {}", workerpool.datasetrestrict),
        );
    }

    issues
}

/// Fail with a `ValidationError` listing every incompatibility.
pub fn check_compatibility(orders: OrderTuple<'_>) -> SdkResult<()> {
    let issues = incompatibilities(orders);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(SdkError::validation(format!("incompatible orders: {}", issues.join("; "))))
    }
}

/// Price of one task for the requester, in nRLC.
pub fn task_price(orders: OrderTuple<'_>) -> u128 {
    u128::from(orders.app.appprice)
        + u128::from(orders.dataset.datasetprice)
        + u128::from(orders.workerpool.workerpoolprice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderFields, OrderKind, create_order, Order};

    pub(crate) fn compatible() -> (AppOrder, WorkerpoolOrder, RequestOrder) {
        let app_addr = Address::repeat_byte(0xa1);
        let pool_addr = Address::repeat_byte(0xb2);
        let Order::App(app) = create_order(
            OrderKind::App,
            OrderFields { app: Some(app_addr), price: Some(3), ..Default::default() },
        )
        .unwrap() else {
            unreachable!()
        };
        let Order::Workerpool(pool) = create_order(
            OrderKind::Workerpool,
            OrderFields {
                workerpool: Some(pool_addr),
                price: Some(2),
                category: Some(1),
                trust: Some(10),
                volume: Some(5),
                ..Default::default()
            },
        )
        .unwrap() else {
            unreachable!()
        };
        let Order::Request(request) = create_order(
            OrderKind::Request,
            OrderFields {
                app: Some(app_addr),
                appmaxprice: Some(3),
                workerpoolmaxprice: Some(5),
                requester: Some(Address::repeat_byte(0xc3)),
                category: Some(1),
                volume: Some(5),
                ..Default::default()
            },
        )
        .unwrap() else {
            unreachable!()
        };
        (app, pool, request)
    }

    #[test]
    fn test_compatible_tuple_passes() {
        let (app, pool, request) = compatible();
        let dataset = DatasetOrder::empty();
        let tuple = OrderTuple { app: &app, dataset: &dataset, workerpool: &pool, request: &request };
        assert!(check_compatibility(tuple).is_ok());
        assert_eq!(task_price(tuple), 5);
    }

    #[test]
    fn test_price_and_app_mismatch_reported() {
        let (app, pool, mut request) = compatible();
        request.appmaxprice = 2;
        request.app = Address::repeat_byte(0x99);
        let dataset = DatasetOrder::empty();
        let issues = incompatibilities(OrderTuple {
            app: &app,
            dataset: &dataset,
            workerpool: &pool,
            request: &request,
        });
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("does not match apporder app"));
        assert!(issues[1].contains("appprice 3 exceeds appmaxprice 2"));
    }

    #[test]
    fn test_tag_must_be_covered_by_workerpool() {
        let (mut app, pool, request) = compatible();
        app.tag = B256::with_last_byte(TAG_TEE);
        let dataset = DatasetOrder::empty();
        let err = check_compatibility(OrderTuple {
            app: &app,
            dataset: &dataset,
            workerpool: &pool,
            request: &request,
        })
        .unwrap_err();
        assert!(err.to_string().contains("does not cover"));
    }

    #[test]
    fn test_tee_request_needs_tee_app() {
        let (app, mut pool, mut request) = compatible();
        request.tag = B256::with_last_byte(TAG_TEE);
        pool.tag = B256::with_last_byte(TAG_TEE);
        let dataset = DatasetOrder::empty();
        let issues = incompatibilities(OrderTuple {
            app: &app,
            dataset: &dataset,
            workerpool: &pool,
            request: &request,
        });
        assert_eq!(issues, vec!["TEE tag requested but the apporder is not tagged TEE".to_string()]);
    }

    #[test]
    fn test_dataset_expected_but_missing() {
        let (app, pool, mut request) = compatible();
        request.dataset = Address::repeat_byte(0xdd);
        let dataset = DatasetOrder::empty();
        assert!(
            check_compatibility(OrderTuple {
                app: &app,
                dataset: &dataset,
                workerpool: &pool,
                request: &request,
            })
            .is_err()
        );
    }

    #[test]
    fn test_requester_restriction() {
        let (app, mut pool, request) = compatible();
        pool.requesterrestrict = Address::repeat_byte(0x01);
        let dataset = DatasetOrder::empty();
        let issues = incompatibilities(OrderTuple {
            app: &app,
            dataset: &dataset,
            workerpool: &pool,
            request: &request,
        });
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("restricted to requester"));
    }
}
