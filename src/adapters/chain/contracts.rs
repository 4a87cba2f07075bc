//! Contract Adapters - Hub, Token and Bridge over alloy
//!
//! Implements the contract ports with ABI-encoded calls through the
//! shared [`ChainProvider`]. Addresses come from the resolved
//! `ChainContext`; nothing here picks a default.

use std::sync::Arc;

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::rpc::types::Filter;
use alloy::sol_types::{Eip712Domain, SolEvent};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::domain::bridge::{BridgeDirection, BridgeLimits, BridgeTransferLog};
use crate::domain::chain::{ResourceKind, TxOptions};
use crate::domain::errors::{SdkError, SdkResult};
use crate::domain::order::{AppOrder, DatasetOrder, Order, RequestOrder, WorkerpoolOrder};
use crate::domain::units::TokenAmount;
use crate::ports::abi::{IexecBridge, IexecPoco, IexecRegistry, IexecToken, Ownable};
use crate::ports::contracts::{
    AccountBalance, BridgeContract, Category, HubContract, OrderOperation, TokenContract,
};

use super::provider::ChainProvider;

fn saturating_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn sign_bytes(sign: Option<&Bytes>) -> Bytes {
    sign.cloned().unwrap_or_default()
}

fn abi_app(order: &AppOrder) -> IexecPoco::AppOrder {
    IexecPoco::AppOrder {
        app: order.app,
        appprice: U256::from(order.appprice),
        volume: U256::from(order.volume),
        tag: order.tag,
        datasetrestrict: order.datasetrestrict,
        workerpoolrestrict: order.workerpoolrestrict,
        requesterrestrict: order.requesterrestrict,
        salt: order.salt,
        sign: sign_bytes(order.sign.as_ref()),
    }
}

fn abi_dataset(order: &DatasetOrder) -> IexecPoco::DatasetOrder {
    IexecPoco::DatasetOrder {
        dataset: order.dataset,
        datasetprice: U256::from(order.datasetprice),
        volume: U256::from(order.volume),
        tag: order.tag,
        apprestrict: order.apprestrict,
        workerpoolrestrict: order.workerpoolrestrict,
        requesterrestrict: order.requesterrestrict,
        salt: order.salt,
        sign: sign_bytes(order.sign.as_ref()),
    }
}

fn abi_workerpool(order: &WorkerpoolOrder) -> IexecPoco::WorkerpoolOrder {
    IexecPoco::WorkerpoolOrder {
        workerpool: order.workerpool,
        workerpoolprice: U256::from(order.workerpoolprice),
        volume: U256::from(order.volume),
        tag: order.tag,
        category: U256::from(order.category),
        trust: U256::from(order.trust),
        apprestrict: order.apprestrict,
        datasetrestrict: order.datasetrestrict,
        requesterrestrict: order.requesterrestrict,
        salt: order.salt,
        sign: sign_bytes(order.sign.as_ref()),
    }
}

fn abi_request(order: &RequestOrder) -> IexecPoco::RequestOrder {
    IexecPoco::RequestOrder {
        app: order.app,
        appmaxprice: U256::from(order.appmaxprice),
        dataset: order.dataset,
        datasetmaxprice: U256::from(order.datasetmaxprice),
        workerpool: order.workerpool,
        workerpoolmaxprice: U256::from(order.workerpoolmaxprice),
        requester: order.requester,
        volume: U256::from(order.volume),
        tag: order.tag,
        category: U256::from(order.category),
        trust: U256::from(order.trust),
        beneficiary: order.beneficiary,
        callback: order.callback,
        params: order.params.clone(),
        salt: order.salt,
        sign: sign_bytes(order.sign.as_ref()),
    }
}

/// The marketplace hub.
pub struct HubAdapter {
    provider: Arc<ChainProvider>,
    address: Address,
    domain: OnceCell<Eip712Domain>,
}

impl HubAdapter {
    pub fn new(provider: Arc<ChainProvider>, address: Address) -> Self {
        Self {
            provider,
            address,
            domain: OnceCell::new(),
        }
    }

    async fn registry(&self, kind: ResourceKind) -> SdkResult<Address> {
        match kind {
            ResourceKind::App => {
                self.provider
                    .view(self.address, IexecPoco::appregistryCall {})
                    .await
            }
            ResourceKind::Dataset => {
                self.provider
                    .view(self.address, IexecPoco::datasetregistryCall {})
                    .await
            }
            ResourceKind::Workerpool => {
                self.provider
                    .view(self.address, IexecPoco::workerpoolregistryCall {})
                    .await
            }
        }
    }
}

#[async_trait]
impl HubContract for HubAdapter {
    fn address(&self) -> Address {
        self.address
    }

    async fn eip712_domain(&self) -> SdkResult<Eip712Domain> {
        self.domain
            .get_or_try_init(|| async {
                let domain = self
                    .provider
                    .view(self.address, IexecPoco::domainCall {})
                    .await?;
                debug!(name = %domain.name, version = %domain.version, "Loaded hub EIP-712 domain");
                Ok::<_, SdkError>(Eip712Domain::new(
                    Some(domain.name.into()),
                    Some(domain.version.into()),
                    Some(domain.chainId),
                    Some(domain.verifyingContract),
                    None,
                ))
            })
            .await
            .cloned()
    }

    async fn token_address(&self) -> SdkResult<Address> {
        self.provider.view(self.address, IexecPoco::tokenCall {}).await
    }

    async fn view_account(&self, owner: Address) -> SdkResult<AccountBalance> {
        let account = self
            .provider
            .view(self.address, IexecPoco::viewAccountCall { account: owner })
            .await?;
        Ok(AccountBalance {
            stake: TokenAmount(account.stake),
            locked: TokenAmount(account.locked),
        })
    }

    async fn view_consumed(&self, order_hash: B256) -> SdkResult<u64> {
        let consumed = self
            .provider
            .view(self.address, IexecPoco::viewConsumedCall { id: order_hash })
            .await?;
        Ok(saturating_u64(consumed))
    }

    async fn verify_signature(&self, identity: Address, hash: B256, sign: Bytes) -> SdkResult<bool> {
        self.provider
            .view(
                self.address,
                IexecPoco::verifySignatureCall {
                    identity,
                    hash,
                    signature: sign,
                },
            )
            .await
    }

    async fn verify_presignature(&self, identity: Address, hash: B256) -> SdkResult<bool> {
        self.provider
            .view(self.address, IexecPoco::verifyPresignatureCall { identity, hash })
            .await
    }

    async fn is_registered(&self, kind: ResourceKind, address: Address) -> SdkResult<bool> {
        let registry = self.registry(kind).await?;
        self.provider
            .view(registry, IexecRegistry::isRegisteredCall { entry: address })
            .await
    }

    async fn resource_owner(&self, address: Address) -> SdkResult<Address> {
        self.provider.view(address, Ownable::ownerCall {}).await
    }

    async fn category(&self, id: u64) -> SdkResult<Option<Category>> {
        let count = self
            .provider
            .view(self.address, IexecPoco::countCategoryCall {})
            .await?;
        if U256::from(id) >= count {
            return Ok(None);
        }
        let category = self
            .provider
            .view(self.address, IexecPoco::viewCategoryCall { index: U256::from(id) })
            .await?;
        Ok(Some(Category {
            id,
            name: category.name,
            description: category.description,
            work_clock_time_ref: saturating_u64(category.workClockTimeRef),
        }))
    }

    #[instrument(skip(self))]
    async fn deposit_native(&self, value: U256, opts: TxOptions) -> SdkResult<B256> {
        self.provider
            .transact(self.address, IexecPoco::depositCall {}, value, opts)
            .await
    }

    #[instrument(skip(self))]
    async fn withdraw(&self, amount: TokenAmount, opts: TxOptions) -> SdkResult<B256> {
        self.provider
            .transact(
                self.address,
                IexecPoco::withdrawCall { amount: amount.raw() },
                U256::ZERO,
                opts,
            )
            .await
    }

    #[instrument(skip_all)]
    async fn match_orders(
        &self,
        app: &AppOrder,
        dataset: &DatasetOrder,
        workerpool: &WorkerpoolOrder,
        request: &RequestOrder,
        opts: TxOptions,
    ) -> SdkResult<B256> {
        let call = IexecPoco::matchOrdersCall {
            appOrder: abi_app(app),
            datasetOrder: abi_dataset(dataset),
            workerpoolOrder: abi_workerpool(workerpool),
            requestOrder: abi_request(request),
        };
        self.provider.transact(self.address, call, U256::ZERO, opts).await
    }

    #[instrument(skip(self, order), fields(kind = %order.kind()))]
    async fn manage_order(&self, order: &Order, operation: OrderOperation, opts: TxOptions) -> SdkResult<B256> {
        let code = operation as u8;
        let sign = Bytes::new();
        match order {
            Order::App(o) => {
                let call = IexecPoco::manageAppOrderCall {
                    operation: IexecPoco::AppOrderOperation { order: abi_app(o), operation: code, sign },
                };
                self.provider.transact(self.address, call, U256::ZERO, opts).await
            }
            Order::Dataset(o) => {
                let call = IexecPoco::manageDatasetOrderCall {
                    operation: IexecPoco::DatasetOrderOperation { order: abi_dataset(o), operation: code, sign },
                };
                self.provider.transact(self.address, call, U256::ZERO, opts).await
            }
            Order::Workerpool(o) => {
                let call = IexecPoco::manageWorkerpoolOrderCall {
                    operation: IexecPoco::WorkerpoolOrderOperation {
                        order: abi_workerpool(o),
                        operation: code,
                        sign,
                    },
                };
                self.provider.transact(self.address, call, U256::ZERO, opts).await
            }
            Order::Request(o) => {
                let call = IexecPoco::manageRequestOrderCall {
                    operation: IexecPoco::RequestOrderOperation {
                        order: abi_request(o),
                        operation: code,
                        sign,
                    },
                };
                self.provider.transact(self.address, call, U256::ZERO, opts).await
            }
        }
    }
}

/// RLC or eRLC token.
pub struct TokenAdapter {
    provider: Arc<ChainProvider>,
    address: Address,
}

impl TokenAdapter {
    pub fn new(provider: Arc<ChainProvider>, address: Address) -> Self {
        Self { provider, address }
    }
}

#[async_trait]
impl TokenContract for TokenAdapter {
    fn address(&self) -> Address {
        self.address
    }

    async fn balance_of(&self, owner: Address) -> SdkResult<U256> {
        self.provider
            .view(self.address, IexecToken::balanceOfCall { owner })
            .await
    }

    #[instrument(skip(self))]
    async fn transfer(&self, to: Address, amount: U256, opts: TxOptions) -> SdkResult<B256> {
        self.provider
            .transact(
                self.address,
                IexecToken::transferCall { to, value: amount },
                U256::ZERO,
                opts,
            )
            .await
    }

    #[instrument(skip(self, extra))]
    async fn approve_and_call(
        &self,
        spender: Address,
        amount: U256,
        extra: Bytes,
        opts: TxOptions,
    ) -> SdkResult<B256> {
        let call = IexecToken::approveAndCallCall {
            spender,
            value: amount,
            extraData: extra,
        };
        self.provider.transact(self.address, call, U256::ZERO, opts).await
    }

    async fn is_kyc(&self, account: Address) -> SdkResult<bool> {
        self.provider
            .view(self.address, IexecToken::isKYCCall { account })
            .await
    }

    #[instrument(skip(self))]
    async fn withdraw(&self, amount: U256, opts: TxOptions) -> SdkResult<B256> {
        self.provider
            .transact(self.address, IexecToken::withdrawCall { amount }, U256::ZERO, opts)
            .await
    }
}

/// One side of the bridge.
///
/// On a token chain transfers into the bridge are token `Transfer` events
/// addressed to it; on a native chain they are the bridge's own
/// `UserRequestForSignature` events.
pub struct BridgeAdapter {
    provider: Arc<ChainProvider>,
    address: Address,
    token: Option<Address>,
}

impl BridgeAdapter {
    /// `token` is the marketplace token on a token chain, `None` on a native chain.
    pub fn new(provider: Arc<ChainProvider>, address: Address, token: Option<Address>) -> Self {
        Self {
            provider,
            address,
            token,
        }
    }
}

#[async_trait]
impl BridgeContract for BridgeAdapter {
    fn address(&self) -> Address {
        self.address
    }

    async fn limits(&self) -> SdkResult<BridgeLimits> {
        let (min_per_tx, max_per_tx, daily_limit) = tokio::try_join!(
            self.provider.view(self.address, IexecBridge::minPerTxCall {}),
            self.provider.view(self.address, IexecBridge::maxPerTxCall {}),
            self.provider.view(self.address, IexecBridge::dailyLimitCall {}),
        )?;
        Ok(BridgeLimits {
            min_per_tx,
            max_per_tx,
            daily_limit,
        })
    }

    async fn current_day(&self) -> SdkResult<u64> {
        let day = self
            .provider
            .view(self.address, IexecBridge::getCurrentDayCall {})
            .await?;
        Ok(saturating_u64(day))
    }

    #[instrument(skip(self))]
    async fn transfer_logs(&self, from_block: u64, to_block: u64) -> SdkResult<Vec<BridgeTransferLog>> {
        let filter = match self.token {
            Some(token) => Filter::new()
                .address(token)
                .event_signature(IexecToken::Transfer::SIGNATURE_HASH)
                .topic2(self.address.into_word()),
            None => Filter::new()
                .address(self.address)
                .event_signature(IexecBridge::UserRequestForSignature::SIGNATURE_HASH),
        }
        .from_block(from_block)
        .to_block(to_block);

        let logs = self.provider.logs(&filter).await?;
        let mut transfers = Vec::with_capacity(logs.len());
        for log in &logs {
            let amount = if self.token.is_some() {
                IexecToken::Transfer::decode_log_data(log.data())
                    .map(|event| event.value)
            } else {
                IexecBridge::UserRequestForSignature::decode_log_data(log.data())
                    .map(|event| event.value)
            }
            .map_err(|e| SdkError::rpc("decode bridge transfer", e))?;

            transfers.push(BridgeTransferLog {
                block_number: log.block_number.unwrap_or_default(),
                log_index: log.log_index.unwrap_or_default(),
                amount,
            });
        }
        debug!(count = transfers.len(), "Bridge transfers scanned");
        Ok(transfers)
    }

    async fn find_completion(
        &self,
        direction: BridgeDirection,
        source_tx_hash: B256,
        from_block: u64,
        to_block: u64,
    ) -> SdkResult<Option<B256>> {
        let signature = match direction {
            BridgeDirection::ToSidechain => IexecBridge::AffirmationCompleted::SIGNATURE_HASH,
            BridgeDirection::ToMainchain => IexecBridge::RelayedMessage::SIGNATURE_HASH,
        };
        let filter = Filter::new()
            .address(self.address)
            .event_signature(signature)
            .from_block(from_block)
            .to_block(to_block);

        let logs = self.provider.logs(&filter).await?;
        let found = logs.iter().find_map(|log| {
            let relayed = match direction {
                BridgeDirection::ToSidechain => {
                    IexecBridge::AffirmationCompleted::decode_log_data(log.data())
                        .ok()
                        .map(|event| event.transactionHash)
                }
                BridgeDirection::ToMainchain => {
                    IexecBridge::RelayedMessage::decode_log_data(log.data())
                        .ok()
                        .map(|event| event.transactionHash)
                }
            };
            (relayed == Some(source_tx_hash)).then_some(log.transaction_hash).flatten()
        });
        Ok(found)
    }
}
