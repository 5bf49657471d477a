pub mod display;
pub mod loader;
pub mod project;
pub mod settings;
pub mod source;
pub mod store;
pub mod types;

pub use display::{display, format_record, DisplayLines};
pub use loader::{parse_collection, RecordError, StoreError};
pub use project::{
    init_project_config, load_project_config, project_rpc_url, ProjectError, PROJECT_CONFIG_FILE,
};
pub use settings::{
    PaymentSettings, RpcSettings, ScaffoldSettings, ServerSettings, Settings, SettingsError,
};
pub use source::{RpcSource, SourceError};
pub use store::{default_collection, EndpointStore, DEFAULT_DIR, DEFAULT_NAME};
pub use types::{
    ApiProtocol, EndpointCollection, EndpointRecord, IpfsApi, IpfsEndpoint, RpcEndpoint,
    RpcProtocol,
};
