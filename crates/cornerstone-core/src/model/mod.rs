//! Records for every console app.

pub mod catalogue;
pub mod credential;
pub mod proof;
pub mod tenant;
pub mod value_type;
pub mod vct;
pub mod zone;

pub use catalogue::{
    CANVAS_COLUMN_GAP, CANVAS_ROW_GAP, CanvasEdge, CanvasNode, CanvasNodeKind, DataType,
    MappingCanvas, Property, ProviderMapping, VocabMapping, VocabProperty, VocabType,
};
pub use credential::{Credential, CredentialAttribute, CredentialFormat, CredentialOrigin};
pub use proof::{
    Predicate, PredicateOp, ProofRequest, ProofRequestStatus, ProofTemplate, RequestedCredential,
    Restriction,
};
pub use tenant::{
    AppId, GithubSettings, GithubSettingsPatch, OrbitSettings, OrbitSettingsPatch, REDACTED,
    TenantConfig, TenantConfigPatch,
};
pub use value_type::ValueType;
pub use vct::{
    ClaimDisplay, ClaimMetadata, ClaimPath, ClaimPathElement, SdPolicy, TypeMetadata,
    VctDefinition, VctDisplay, format_claim_path,
};
pub use zone::{CardFace, Zone, ZonePosition, ZoneRole, ZoneTemplate};
