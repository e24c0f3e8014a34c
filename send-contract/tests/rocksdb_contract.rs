//! End-to-end tests against the RocksDB state store

use prost::Message as _;
use send_contract::{
    contract::{CheckRequest, DeliverRequest},
    keys::{key_for_account, key_for_fee_params},
    Account, Config, Contract, Error, FeeParams, Message, MessageSend, Plugin, RocksStore,
    Transaction,
};
use tempfile::TempDir;

const ALICE: [u8; 20] = [0x11; 20];
const BOB: [u8; 20] = [0x22; 20];

fn test_config() -> (Config, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();
    (config, temp_dir)
}

fn send_tx(amount: u64, fee: u64) -> Transaction {
    Transaction::new(
        &Message::Send(MessageSend {
            from_address: ALICE.to_vec(),
            to_address: BOB.to_vec(),
            amount,
        }),
        fee,
    )
}

fn balance(store: &RocksStore, address: &[u8]) -> Option<u64> {
    store
        .get(&key_for_account(address))
        .unwrap()
        .map(|bytes| Account::decode(bytes.as_slice()).unwrap().amount)
}

#[test]
fn test_check_then_deliver_persists() {
    let (config, _temp) = test_config();
    {
        let store = RocksStore::open(&config).unwrap();
        store
            .put(&key_for_fee_params(), &FeeParams { send_fee: 10 }.encode_to_vec())
            .unwrap();
        let alice = Account {
            address: ALICE.to_vec(),
            amount: 100,
        };
        store
            .put(&key_for_account(&ALICE), &alice.encode_to_vec())
            .unwrap();

        let contract = Contract::new(store);

        let low = contract.check_tx(CheckRequest { tx: send_tx(60, 5) });
        assert!(matches!(low.error, Some(Error::FeeTooLow { .. })));

        let check = contract.check_tx(CheckRequest { tx: send_tx(60, 10) });
        assert!(check.error.is_none());
        assert_eq!(check.authorized_signers, vec![ALICE.to_vec()]);

        let deliver = contract.deliver_tx(DeliverRequest { tx: send_tx(60, 10) });
        assert!(deliver.error.is_none());
    }

    // Reopen and verify the committed batch
    let store = RocksStore::open(&config).unwrap();
    assert_eq!(balance(&store, &ALICE), Some(40));
    assert_eq!(balance(&store, &BOB), Some(60));
}

#[test]
fn test_drain_deletes_sender_key() {
    let (config, _temp) = test_config();
    let store = RocksStore::open(&config).unwrap();
    let alice = Account {
        address: ALICE.to_vec(),
        amount: 100,
    };
    store
        .put(&key_for_account(&ALICE), &alice.encode_to_vec())
        .unwrap();
    let contract = Contract::new(store);

    contract.deliver(&send_tx(100, 0)).unwrap();

    assert_eq!(balance(contract.store(), &ALICE), None);
    assert_eq!(balance(contract.store(), &BOB), Some(100));

    // The drained sender is now a zero-balance account
    assert!(matches!(
        contract.deliver(&send_tx(1, 0)),
        Err(Error::InsufficientFunds { balance: 0, amount: 1 })
    ));
}
