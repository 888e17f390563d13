pub mod analytics;
pub mod config;
pub mod domain;
pub mod errors;

pub use analytics::{
    analyze_win_loss_patterns, extract_buyer_personas, AnalysisRequest, PersonaRequest,
    WinLossAnalyzer,
};
pub use config::{AnalysisConfig, AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::analysis::{
    AnalysisNotice, AnalysisResult, AnalysisSummary, DecisionMakerPatterns, IcpRecommendation,
    LossPattern, Pattern, Persona, PersonaResult, ThresholdAnalysis, ValidationReport,
};
pub use domain::deal::{
    AccountSnapshot, ContactRecord, ContactRole, DealId, DealOutcome, DealRecord,
};
pub use errors::{AnalysisError, ApplicationError, InterfaceError};
