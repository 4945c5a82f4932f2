//! Shared fixtures for tickr behavior tests

use std::sync::Arc;

use tickr_core::{Credentials, Gateway, MemoryGateway};

pub const DEMO_EMAIL: &str = "arjun@tickr.io";
pub const DEMO_PASSWORD: &str = "secret1";

pub fn demo_credentials() -> Credentials {
    Credentials {
        email: String::from(DEMO_EMAIL),
        password: String::from(DEMO_PASSWORD),
    }
}

/// Signs the demo user into `gateway` and shares it.
pub async fn logged_in(gateway: MemoryGateway) -> Arc<MemoryGateway> {
    let gateway = Arc::new(gateway);
    gateway
        .login(&demo_credentials())
        .await
        .expect("demo login");
    gateway
}
