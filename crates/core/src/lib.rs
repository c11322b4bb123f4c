pub mod comments;
pub mod config;
pub mod html;
pub mod http;
pub mod metrics;
pub mod resolver;
pub mod strategy;
pub mod testing;

pub use comments::{CommentEnricher, DoubanCommentEnricher};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use http::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient, TransportError};
pub use resolver::{
    BookCache, BookRecord, CacheStats, Comment, Query, RecordSource, ResolveError, Resolver,
    StrategyExecutor, TitleMatcher,
};
pub use strategy::{Strategy, StrategyFailure};
