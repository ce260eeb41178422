//! Ledger integration tests
//!
//! Drives the public ledger API end to end: wallets sign, the chain accepts
//! or refuses, mining seals blocks and balances follow.

use gossip_chain::core::{Blockchain, ProofOfWork, GENESIS_PREVIOUS_HASH};
use gossip_chain::{BlockchainError, LedgerSettings, Wallet};

fn quick_chain() -> Blockchain {
    Blockchain::with_settings(&LedgerSettings {
        difficulty: 2,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn test_spending_without_funds_is_refused() {
    let mut blockchain = quick_chain();
    let alice = Wallet::new();

    let tx = alice.create_transaction("bob", 10).unwrap();
    let err = blockchain.submit_transaction(tx).unwrap_err();

    assert_eq!(
        err,
        BlockchainError::InsufficientBalance {
            required: 10,
            available: 0
        }
    );
    assert!(blockchain.get_pending_transactions().is_empty());
    assert_eq!(blockchain.get_blocks().len(), 1);
}

#[test]
fn test_mining_pays_the_miner_and_drains_the_pool() {
    let mut blockchain = quick_chain();
    let miner = Wallet::new();

    let block = blockchain.mine(miner.get_public_key()).unwrap();

    assert_eq!(blockchain.get_blocks().len(), 2);
    assert_eq!(blockchain.balance_of(miner.get_public_key()), 50);
    assert!(blockchain.get_pending_transactions().is_empty());
    assert!(block.get_hash().starts_with("00"));
    assert!(ProofOfWork::validate(&block, 2));
}

#[test]
fn test_blocks_link_and_hash_to_their_contents() {
    let mut blockchain = quick_chain();
    let alice = Wallet::new();
    let bob = Wallet::new();

    blockchain.mine(alice.get_public_key()).unwrap();
    let tx = alice.create_transaction(bob.get_public_key(), 15).unwrap();
    blockchain.submit_transaction(tx).unwrap();
    blockchain.mine(bob.get_public_key()).unwrap();

    let blocks = blockchain.get_blocks();
    assert_eq!(blocks[0].get_previous_hash(), GENESIS_PREVIOUS_HASH);
    for pair in blocks.windows(2) {
        assert_eq!(pair[1].get_previous_hash(), pair[0].get_hash());
    }
    for block in blocks {
        assert_eq!(block.calculate_hash().unwrap(), block.get_hash());
    }

    // Validation is read-only, asking twice gives the same answer
    assert!(blockchain.is_valid());
    assert!(blockchain.is_valid());
    assert!(blockchain.is_valid_with_work());
}

#[test]
fn test_transfers_conserve_value() {
    let mut blockchain = quick_chain();
    let alice = Wallet::new();
    let bob = Wallet::new();
    let carol = Wallet::new();

    blockchain.mine(alice.get_public_key()).unwrap();
    blockchain.mine(alice.get_public_key()).unwrap();

    let to_bob = alice.create_transaction(bob.get_public_key(), 30).unwrap();
    blockchain.submit_transaction(to_bob).unwrap();
    blockchain.mine(carol.get_public_key()).unwrap();

    let to_carol = bob.create_transaction(carol.get_public_key(), 12).unwrap();
    blockchain.submit_transaction(to_carol).unwrap();
    blockchain.mine(carol.get_public_key()).unwrap();

    let alice_balance = blockchain.balance_of(alice.get_public_key());
    let bob_balance = blockchain.balance_of(bob.get_public_key());
    let carol_balance = blockchain.balance_of(carol.get_public_key());

    assert_eq!(alice_balance, 70);
    assert_eq!(bob_balance, 18);
    assert_eq!(carol_balance, 112);
    // Only rewards create value: four blocks mined at 50 each
    assert_eq!(alice_balance + bob_balance + carol_balance, 200);
}

#[test]
fn test_pending_transfers_wait_for_the_next_block() {
    let mut blockchain = quick_chain();
    let alice = Wallet::new();

    blockchain.mine(alice.get_public_key()).unwrap();
    let tx = alice.create_transaction("bob", 20).unwrap();
    blockchain.submit_transaction(tx).unwrap();

    assert_eq!(blockchain.balance_of("bob"), 0);
    assert_eq!(blockchain.balance_of(alice.get_public_key()), 50);
    assert_eq!(blockchain.get_pending_transactions().len(), 1);
}
