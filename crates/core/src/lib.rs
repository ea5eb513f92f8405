pub mod assembler;
pub mod backend;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod request;
pub mod retry;
pub mod searcher;
pub mod testing;
pub mod transcoder;
pub mod trimmer;
pub mod workspace;

pub use assembler::merge;
pub use backend::{Backend, BackendLocator, FfmpegLocator, LocatorError, Platform};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, SanitizedConfig, ServerConfig, SmtpConfig,
};
pub use error::MashupError;
pub use fetcher::{
    AudioDownloader, AudioFetcher, DownloadError, DownloadRequest, FetchSkip, FetchedFile,
    YtDlpDownloader,
};
pub use orchestrator::{MashupOrchestrator, MashupRunner};
pub use request::{coerce_positive_int, normalize_output_path, validate, MashupRequest};
pub use retry::RetryPolicy;
pub use searcher::{discover, Candidate, SearchEntry, SearchError, VideoSearcher, YtDlpSearcher};
pub use transcoder::{ConcatJob, FfmpegTranscoder, TranscodeError, Transcoder, TrimJob};
pub use trimmer::{ClipTrimmer, FsReadCheck, ReadCheck, TrimSkip, TrimmedClip};
pub use workspace::Workspace;
