use serde::Deserialize;
use spkg_api_types::index::IndexProvider;
use spkg_auth::AuthProvider;
use spkg_server::ServiceConfig;
use spkg_storage::fs::StoreConfig;

#[derive(Deserialize)]
pub struct Config<I: IndexProvider, A: AuthProvider> {
    pub service: ServiceConfig,
    #[serde(flatten)]
    pub index_config: I::Config,
    #[serde(flatten)]
    pub auth_config: A::Config,
    pub store: StoreConfig,
}
