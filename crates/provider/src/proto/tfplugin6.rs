//! Terraform Plugin Protocol v6, hand-maintained prost rendition.
//!
//! Covers the subset of `tfplugin6.proto` this provider serves: the
//! message types and the `tfplugin6.Provider` gRPC service. Wire tags
//! follow the upstream protocol definition.

use std::collections::HashMap;

/// A value encoded with one of Terraform's dynamic encodings.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DynamicValue {
    #[prost(bytes = "vec", tag = "1")]
    pub msgpack: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub json: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Diagnostic {
    #[prost(enumeration = "diagnostic::Severity", tag = "1")]
    pub severity: i32,
    #[prost(string, tag = "2")]
    pub summary: String,
    #[prost(string, tag = "3")]
    pub detail: String,
    #[prost(message, optional, tag = "4")]
    pub attribute: Option<AttributePath>,
}

pub mod diagnostic {
    #[derive(
        Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
    )]
    #[repr(i32)]
    pub enum Severity {
        Invalid = 0,
        Error = 1,
        Warning = 2,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttributePath {
    #[prost(message, repeated, tag = "1")]
    pub steps: Vec<attribute_path::Step>,
}

pub mod attribute_path {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Step {
        #[prost(oneof = "step::Selector", tags = "1, 2, 3")]
        pub selector: Option<step::Selector>,
    }

    pub mod step {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Selector {
            #[prost(string, tag = "1")]
            AttributeName(String),
            #[prost(string, tag = "2")]
            ElementKeyString(String),
            #[prost(int64, tag = "3")]
            ElementKeyInt(i64),
        }
    }
}

/// Resource state as stored by Terraform core, possibly from an older
/// schema version.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RawState {
    #[prost(bytes = "vec", tag = "1")]
    pub json: Vec<u8>,
    #[prost(map = "string, string", tag = "2")]
    pub flatmap: HashMap<String, String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum StringKind {
    Plain = 0,
    Markdown = 1,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Schema {
    #[prost(int64, tag = "1")]
    pub version: i64,
    #[prost(message, optional, tag = "2")]
    pub block: Option<schema::Block>,
}

pub mod schema {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Block {
        #[prost(int64, tag = "1")]
        pub version: i64,
        #[prost(message, repeated, tag = "2")]
        pub attributes: Vec<Attribute>,
        #[prost(message, repeated, tag = "3")]
        pub block_types: Vec<NestedBlock>,
        #[prost(string, tag = "4")]
        pub description: String,
        #[prost(enumeration = "super::StringKind", tag = "5")]
        pub description_kind: i32,
        #[prost(bool, tag = "6")]
        pub deprecated: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Attribute {
        #[prost(string, tag = "1")]
        pub name: String,
        /// Type constraint serialized with cty's JSON encoding.
        #[prost(bytes = "vec", tag = "2")]
        pub r#type: Vec<u8>,
        #[prost(string, tag = "3")]
        pub description: String,
        #[prost(bool, tag = "4")]
        pub required: bool,
        #[prost(bool, tag = "5")]
        pub optional: bool,
        #[prost(bool, tag = "6")]
        pub computed: bool,
        #[prost(bool, tag = "7")]
        pub sensitive: bool,
        #[prost(enumeration = "super::StringKind", tag = "8")]
        pub description_kind: i32,
        #[prost(bool, tag = "9")]
        pub deprecated: bool,
        #[prost(message, optional, tag = "10")]
        pub nested_type: Option<Object>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct NestedBlock {
        #[prost(string, tag = "1")]
        pub type_name: String,
        #[prost(message, optional, tag = "2")]
        pub block: Option<Block>,
        #[prost(enumeration = "nested_block::NestingMode", tag = "3")]
        pub nesting: i32,
        #[prost(int64, tag = "4")]
        pub min_items: i64,
        #[prost(int64, tag = "5")]
        pub max_items: i64,
    }

    pub mod nested_block {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
        )]
        #[repr(i32)]
        pub enum NestingMode {
            Invalid = 0,
            Single = 1,
            List = 2,
            Set = 3,
            Map = 4,
            Group = 5,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Object {
        #[prost(message, repeated, tag = "1")]
        pub attributes: Vec<Attribute>,
        #[prost(enumeration = "object::NestingMode", tag = "3")]
        pub nesting: i32,
    }

    pub mod object {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
        )]
        #[repr(i32)]
        pub enum NestingMode {
            Invalid = 0,
            Single = 1,
            List = 2,
            Set = 3,
            Map = 4,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServerCapabilities {
    #[prost(bool, tag = "1")]
    pub plan_destroy: bool,
    #[prost(bool, tag = "2")]
    pub get_provider_schema_optional: bool,
    #[prost(bool, tag = "3")]
    pub move_resource_state: bool,
}

/// Provider-deferred action marker; this provider never defers.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Deferred {
    #[prost(int32, tag = "1")]
    pub reason: i32,
}

/// Provider-defined function signature. This provider defines none.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Function {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FunctionError {
    #[prost(string, tag = "1")]
    pub text: String,
    #[prost(int64, optional, tag = "2")]
    pub function_argument: Option<i64>,
}

pub mod get_provider_schema {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, optional, tag = "1")]
        pub provider: Option<super::Schema>,
        #[prost(map = "string, message", tag = "2")]
        pub resource_schemas: std::collections::HashMap<String, super::Schema>,
        #[prost(map = "string, message", tag = "3")]
        pub data_source_schemas: std::collections::HashMap<String, super::Schema>,
        #[prost(message, repeated, tag = "4")]
        pub diagnostics: Vec<super::Diagnostic>,
        #[prost(message, optional, tag = "5")]
        pub provider_meta: Option<super::Schema>,
        #[prost(message, optional, tag = "6")]
        pub server_capabilities: Option<super::ServerCapabilities>,
        #[prost(map = "string, message", tag = "7")]
        pub functions: std::collections::HashMap<String, super::Function>,
    }
}

pub mod validate_provider_config {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(message, optional, tag = "1")]
        pub config: Option<super::DynamicValue>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, repeated, tag = "2")]
        pub diagnostics: Vec<super::Diagnostic>,
    }
}

pub mod upgrade_resource_state {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(string, tag = "1")]
        pub type_name: String,
        #[prost(int64, tag = "2")]
        pub version: i64,
        #[prost(message, optional, tag = "3")]
        pub raw_state: Option<super::RawState>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, optional, tag = "1")]
        pub upgraded_state: Option<super::DynamicValue>,
        #[prost(message, repeated, tag = "2")]
        pub diagnostics: Vec<super::Diagnostic>,
    }
}

pub mod validate_resource_config {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(string, tag = "1")]
        pub type_name: String,
        #[prost(message, optional, tag = "2")]
        pub config: Option<super::DynamicValue>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, repeated, tag = "1")]
        pub diagnostics: Vec<super::Diagnostic>,
    }
}

pub mod validate_data_resource_config {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(string, tag = "1")]
        pub type_name: String,
        #[prost(message, optional, tag = "2")]
        pub config: Option<super::DynamicValue>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, repeated, tag = "1")]
        pub diagnostics: Vec<super::Diagnostic>,
    }
}

pub mod configure_provider {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(string, tag = "1")]
        pub terraform_version: String,
        #[prost(message, optional, tag = "2")]
        pub config: Option<super::DynamicValue>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, repeated, tag = "1")]
        pub diagnostics: Vec<super::Diagnostic>,
    }
}

pub mod read_resource {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(string, tag = "1")]
        pub type_name: String,
        #[prost(message, optional, tag = "2")]
        pub current_state: Option<super::DynamicValue>,
        #[prost(bytes = "vec", tag = "3")]
        pub private: Vec<u8>,
        #[prost(message, optional, tag = "4")]
        pub provider_meta: Option<super::DynamicValue>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, optional, tag = "1")]
        pub new_state: Option<super::DynamicValue>,
        #[prost(message, repeated, tag = "2")]
        pub diagnostics: Vec<super::Diagnostic>,
        #[prost(bytes = "vec", tag = "3")]
        pub private: Vec<u8>,
        #[prost(message, optional, tag = "4")]
        pub deferred: Option<super::Deferred>,
    }
}

pub mod plan_resource_change {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(string, tag = "1")]
        pub type_name: String,
        #[prost(message, optional, tag = "2")]
        pub prior_state: Option<super::DynamicValue>,
        #[prost(message, optional, tag = "3")]
        pub proposed_new_state: Option<super::DynamicValue>,
        #[prost(message, optional, tag = "4")]
        pub config: Option<super::DynamicValue>,
        #[prost(bytes = "vec", tag = "5")]
        pub prior_private: Vec<u8>,
        #[prost(message, optional, tag = "6")]
        pub provider_meta: Option<super::DynamicValue>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, optional, tag = "1")]
        pub planned_state: Option<super::DynamicValue>,
        #[prost(message, repeated, tag = "2")]
        pub requires_replace: Vec<super::AttributePath>,
        #[prost(bytes = "vec", tag = "3")]
        pub planned_private: Vec<u8>,
        #[prost(message, repeated, tag = "4")]
        pub diagnostics: Vec<super::Diagnostic>,
        #[prost(bool, tag = "5")]
        pub legacy_type_system: bool,
        #[prost(message, optional, tag = "6")]
        pub deferred: Option<super::Deferred>,
    }
}

pub mod apply_resource_change {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(string, tag = "1")]
        pub type_name: String,
        #[prost(message, optional, tag = "2")]
        pub prior_state: Option<super::DynamicValue>,
        #[prost(message, optional, tag = "3")]
        pub planned_state: Option<super::DynamicValue>,
        #[prost(message, optional, tag = "4")]
        pub config: Option<super::DynamicValue>,
        #[prost(bytes = "vec", tag = "5")]
        pub planned_private: Vec<u8>,
        #[prost(message, optional, tag = "6")]
        pub provider_meta: Option<super::DynamicValue>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, optional, tag = "1")]
        pub new_state: Option<super::DynamicValue>,
        #[prost(bytes = "vec", tag = "2")]
        pub private: Vec<u8>,
        #[prost(message, repeated, tag = "3")]
        pub diagnostics: Vec<super::Diagnostic>,
        #[prost(bool, tag = "4")]
        pub legacy_type_system: bool,
    }
}

pub mod import_resource_state {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(string, tag = "1")]
        pub type_name: String,
        #[prost(string, tag = "2")]
        pub id: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ImportedResource {
        #[prost(string, tag = "1")]
        pub type_name: String,
        #[prost(message, optional, tag = "2")]
        pub state: Option<super::DynamicValue>,
        #[prost(bytes = "vec", tag = "3")]
        pub private: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, repeated, tag = "1")]
        pub imported_resources: Vec<ImportedResource>,
        #[prost(message, repeated, tag = "2")]
        pub diagnostics: Vec<super::Diagnostic>,
        #[prost(message, optional, tag = "3")]
        pub deferred: Option<super::Deferred>,
    }
}

pub mod move_resource_state {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(string, tag = "1")]
        pub source_provider_address: String,
        #[prost(string, tag = "2")]
        pub source_type_name: String,
        #[prost(int64, tag = "3")]
        pub source_schema_version: i64,
        #[prost(message, optional, tag = "4")]
        pub source_state: Option<super::RawState>,
        #[prost(string, tag = "5")]
        pub target_type_name: String,
        #[prost(bytes = "vec", tag = "6")]
        pub source_private: Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, optional, tag = "1")]
        pub target_state: Option<super::DynamicValue>,
        #[prost(message, repeated, tag = "2")]
        pub diagnostics: Vec<super::Diagnostic>,
    }
}

pub mod read_data_source {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(string, tag = "1")]
        pub type_name: String,
        #[prost(message, optional, tag = "2")]
        pub config: Option<super::DynamicValue>,
        #[prost(message, optional, tag = "3")]
        pub provider_meta: Option<super::DynamicValue>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, optional, tag = "1")]
        pub state: Option<super::DynamicValue>,
        #[prost(message, repeated, tag = "2")]
        pub diagnostics: Vec<super::Diagnostic>,
        #[prost(message, optional, tag = "3")]
        pub deferred: Option<super::Deferred>,
    }
}

pub mod get_functions {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(map = "string, message", tag = "1")]
        pub functions: std::collections::HashMap<String, super::Function>,
        #[prost(message, repeated, tag = "2")]
        pub diagnostics: Vec<super::Diagnostic>,
    }
}

pub mod call_function {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(message, repeated, tag = "2")]
        pub arguments: Vec<super::DynamicValue>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(message, optional, tag = "1")]
        pub result: Option<super::DynamicValue>,
        #[prost(message, optional, tag = "2")]
        pub error: Option<super::FunctionError>,
    }
}

pub mod stop_provider {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Request {}

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Response {
        #[prost(string, tag = "1")]
        pub error: String,
    }
}

pub mod provider_server {
    #![allow(unused_variables)]

    use tonic::codegen::*;

    /// The `tfplugin6.Provider` service, implemented by the provider.
    #[tonic::async_trait]
    pub trait Provider: Send + Sync + 'static {
        async fn get_provider_schema(
            &self,
            request: tonic::Request<super::get_provider_schema::Request>,
        ) -> Result<tonic::Response<super::get_provider_schema::Response>, tonic::Status>;

        async fn validate_provider_config(
            &self,
            request: tonic::Request<super::validate_provider_config::Request>,
        ) -> Result<tonic::Response<super::validate_provider_config::Response>, tonic::Status>;

        async fn validate_resource_config(
            &self,
            request: tonic::Request<super::validate_resource_config::Request>,
        ) -> Result<tonic::Response<super::validate_resource_config::Response>, tonic::Status>;

        async fn validate_data_resource_config(
            &self,
            request: tonic::Request<super::validate_data_resource_config::Request>,
        ) -> Result<tonic::Response<super::validate_data_resource_config::Response>, tonic::Status>;

        async fn upgrade_resource_state(
            &self,
            request: tonic::Request<super::upgrade_resource_state::Request>,
        ) -> Result<tonic::Response<super::upgrade_resource_state::Response>, tonic::Status>;

        async fn configure_provider(
            &self,
            request: tonic::Request<super::configure_provider::Request>,
        ) -> Result<tonic::Response<super::configure_provider::Response>, tonic::Status>;

        async fn read_resource(
            &self,
            request: tonic::Request<super::read_resource::Request>,
        ) -> Result<tonic::Response<super::read_resource::Response>, tonic::Status>;

        async fn plan_resource_change(
            &self,
            request: tonic::Request<super::plan_resource_change::Request>,
        ) -> Result<tonic::Response<super::plan_resource_change::Response>, tonic::Status>;

        async fn apply_resource_change(
            &self,
            request: tonic::Request<super::apply_resource_change::Request>,
        ) -> Result<tonic::Response<super::apply_resource_change::Response>, tonic::Status>;

        async fn import_resource_state(
            &self,
            request: tonic::Request<super::import_resource_state::Request>,
        ) -> Result<tonic::Response<super::import_resource_state::Response>, tonic::Status>;

        async fn move_resource_state(
            &self,
            request: tonic::Request<super::move_resource_state::Request>,
        ) -> Result<tonic::Response<super::move_resource_state::Response>, tonic::Status>;

        async fn read_data_source(
            &self,
            request: tonic::Request<super::read_data_source::Request>,
        ) -> Result<tonic::Response<super::read_data_source::Response>, tonic::Status>;

        async fn get_functions(
            &self,
            request: tonic::Request<super::get_functions::Request>,
        ) -> Result<tonic::Response<super::get_functions::Response>, tonic::Status>;

        async fn call_function(
            &self,
            request: tonic::Request<super::call_function::Request>,
        ) -> Result<tonic::Response<super::call_function::Response>, tonic::Status>;

        async fn stop_provider(
            &self,
            request: tonic::Request<super::stop_provider::Request>,
        ) -> Result<tonic::Response<super::stop_provider::Response>, tonic::Status>;
    }

    #[derive(Debug)]
    pub struct ProviderServer<T: Provider> {
        inner: Arc<T>,
    }

    impl<T: Provider> ProviderServer<T> {
        pub fn new(inner: T) -> Self {
            Self {
                inner: Arc::new(inner),
            }
        }

        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
    }

    impl<T: Provider> Clone for ProviderServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<T, B> tonic::codegen::Service<http::Request<B>> for ProviderServer<T>
    where
        T: Provider,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(
            &mut self,
            _cx: &mut Context<'_>,
        ) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            macro_rules! unary {
                ($method:ident, $request:ty, $response:ty) => {{
                    struct Svc<T: Provider>(Arc<T>);
                    impl<T: Provider> tonic::server::UnaryService<$request> for Svc<T> {
                        type Response = $response;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(&mut self, request: tonic::Request<$request>) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.$method(request).await })
                        }
                    }
                    let inner = Arc::clone(&self.inner);
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(Svc(inner), req).await)
                    })
                }};
            }

            match req.uri().path() {
                "/tfplugin6.Provider/GetProviderSchema" => unary!(
                    get_provider_schema,
                    super::get_provider_schema::Request,
                    super::get_provider_schema::Response
                ),
                "/tfplugin6.Provider/ValidateProviderConfig" => unary!(
                    validate_provider_config,
                    super::validate_provider_config::Request,
                    super::validate_provider_config::Response
                ),
                "/tfplugin6.Provider/ValidateResourceConfig" => unary!(
                    validate_resource_config,
                    super::validate_resource_config::Request,
                    super::validate_resource_config::Response
                ),
                "/tfplugin6.Provider/ValidateDataResourceConfig" => unary!(
                    validate_data_resource_config,
                    super::validate_data_resource_config::Request,
                    super::validate_data_resource_config::Response
                ),
                "/tfplugin6.Provider/UpgradeResourceState" => unary!(
                    upgrade_resource_state,
                    super::upgrade_resource_state::Request,
                    super::upgrade_resource_state::Response
                ),
                "/tfplugin6.Provider/ConfigureProvider" => unary!(
                    configure_provider,
                    super::configure_provider::Request,
                    super::configure_provider::Response
                ),
                "/tfplugin6.Provider/ReadResource" => unary!(
                    read_resource,
                    super::read_resource::Request,
                    super::read_resource::Response
                ),
                "/tfplugin6.Provider/PlanResourceChange" => unary!(
                    plan_resource_change,
                    super::plan_resource_change::Request,
                    super::plan_resource_change::Response
                ),
                "/tfplugin6.Provider/ApplyResourceChange" => unary!(
                    apply_resource_change,
                    super::apply_resource_change::Request,
                    super::apply_resource_change::Response
                ),
                "/tfplugin6.Provider/ImportResourceState" => unary!(
                    import_resource_state,
                    super::import_resource_state::Request,
                    super::import_resource_state::Response
                ),
                "/tfplugin6.Provider/MoveResourceState" => unary!(
                    move_resource_state,
                    super::move_resource_state::Request,
                    super::move_resource_state::Response
                ),
                "/tfplugin6.Provider/ReadDataSource" => unary!(
                    read_data_source,
                    super::read_data_source::Request,
                    super::read_data_source::Response
                ),
                "/tfplugin6.Provider/GetFunctions" => unary!(
                    get_functions,
                    super::get_functions::Request,
                    super::get_functions::Response
                ),
                "/tfplugin6.Provider/CallFunction" => unary!(
                    call_function,
                    super::call_function::Request,
                    super::call_function::Response
                ),
                "/tfplugin6.Provider/StopProvider" => unary!(
                    stop_provider,
                    super::stop_provider::Request,
                    super::stop_provider::Response
                ),
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(empty_body())
                        .unwrap())
                }),
            }
        }
    }

    impl<T: Provider> tonic::server::NamedService for ProviderServer<T> {
        const NAME: &'static str = "tfplugin6.Provider";
    }
}
