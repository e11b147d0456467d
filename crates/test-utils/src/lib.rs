//! Shared helpers for exercising the naming stack in tests: a scripted mock
//! chain, transaction/PSBT builders, and storage setup.

pub mod chain;
pub mod tx;

use std::sync::Arc;

use stela_db::stubs::StubBackend;
use stela_params::ProtocolParams;
use stela_storage::{create_index_storage, IndexStorage};

/// Protocol params tuned for unit tests.
pub fn test_params() -> ProtocolParams {
    ProtocolParams::regtest()
}

/// Fresh stub-backed storage with a small worker pool.
pub fn test_storage() -> Arc<IndexStorage> {
    let pool = threadpool::Builder::new().num_threads(2).build();
    let storage =
        create_index_storage(Arc::new(StubBackend::new()), pool).expect("create stub storage");
    Arc::new(storage)
}

/// A fresh random x-only key, as stored in commitments.
pub fn random_owner_key() -> stela_primitives::buf::Buf32 {
    use bitcoin::{
        key::Keypair,
        secp256k1::{Secp256k1, XOnlyPublicKey},
    };
    let secp = Secp256k1::new();
    let keypair = Keypair::new(&secp, &mut rand::thread_rng());
    let (xonly, _) = XOnlyPublicKey::from_keypair(&keypair);
    stela_primitives::buf::Buf32::new(xonly.serialize())
}
