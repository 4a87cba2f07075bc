//! Normalized transaction receipts and expected-event checks.

use alloy::primitives::{Address, B256, Bytes};
use alloy::sol_types::SolEvent;

use super::errors::{SdkError, SdkResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Receipt of a mined transaction, stripped to what the client inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub success: bool,
    pub logs: Vec<ReceiptLog>,
}

impl TxReceipt {
    /// First `E` emitted by `emitter`, decoded.
    pub fn find_event<E: SolEvent>(&self, emitter: Address) -> Option<E> {
        self.logs
            .iter()
            .filter(|log| log.address == emitter)
            .filter(|log| log.topics.first() == Some(&E::SIGNATURE_HASH))
            .find_map(|log| E::decode_raw_log(log.topics.iter().copied(), &log.data).ok())
    }

    /// Like [`Self::find_event`] but a missing event is `TransactionNotConfirmed`.
    pub fn expect_event<E: SolEvent>(&self, emitter: Address) -> SdkResult<E> {
        self.find_event(emitter).ok_or(SdkError::TransactionNotConfirmed {
            tx_hash: self.tx_hash,
            event: E::SIGNATURE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    alloy::sol! {
        event Transfer(address indexed from, address indexed to, uint256 value);
    }

    fn transfer_log(emitter: Address, value: u64) -> ReceiptLog {
        let event = Transfer {
            from: Address::repeat_byte(1),
            to: Address::repeat_byte(2),
            value: U256::from(value),
        };
        let data = event.encode_log_data();
        ReceiptLog { address: emitter, topics: data.topics().to_vec(), data: data.data }
    }

    #[test]
    fn test_event_found_only_from_emitter() {
        let token = Address::repeat_byte(0x70);
        let receipt = TxReceipt {
            tx_hash: B256::repeat_byte(9),
            block_number: 1,
            success: true,
            logs: vec![transfer_log(Address::repeat_byte(0x71), 1), transfer_log(token, 42)],
        };
        let event: Transfer = receipt.expect_event(token).unwrap();
        assert_eq!(event.value, U256::from(42));

        let err = receipt.expect_event::<Transfer>(Address::ZERO).unwrap_err();
        assert_eq!(err.name(), "TransactionNotConfirmedError");
    }
}
