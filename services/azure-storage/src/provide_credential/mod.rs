mod env;
pub use env::EnvCredentialProvider;

mod static_provider;
pub use static_provider::StaticCredentialProvider;

mod account_key;
pub use account_key::AccountKeyCredentialProvider;
