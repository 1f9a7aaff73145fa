pub mod aggregate;
pub mod document;
pub mod flags;
pub mod flow;
pub mod mapper;
pub mod modules;
pub mod orchestrator;
pub mod profile;
pub mod record;
pub mod registry;
pub mod risk;
pub mod scorecard;

pub use aggregate::{
    aggregate, AggregatedAnalysis, AnalysisStatus, ModuleFailure, Recommendation, RecommendationTier,
    RiskSummary,
};
pub use document::{CompanyDocument, DocumentKind};
pub use flow::{
    ExternalResult, FlowClient, FlowError, FlowHealth, FlowRequest, FlowTransport, HttpFlowTransport,
    OfflineTransport, ResultSource, RetryPolicy, Sleeper, TokioSleeper, TransportError,
};
pub use mapper::{DataMapper, DataMappingRule, MappingOutcome, ModuleInput, ValidationIssue, ValueKind};
pub use modules::{ModuleCatalog, ModuleError, ModuleResult, ModuleStatus, ScoreScale, ScoringModule};
pub use orchestrator::{Orchestrator, OrchestratorError};
pub use profile::CompanyProfile;
pub use record::{CompanyRecord, RecordError};
pub use registry::{Activation, ModuleCategory, ModuleConfiguration, ModuleId, ModuleRegistry, RegistryError};
pub use risk::{RiskDomain, RiskDomainScores, RiskLevel};
pub use scorecard::{Framework, Scorecard};
