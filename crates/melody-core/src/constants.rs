//! Defaults shared between configuration and the components that consume it.

/// Successful downloads allowed per client before requests are refused.
pub const DEFAULT_DOWNLOAD_LIMIT: i32 = 5;

/// Lowest verification score still treated as human.
pub const DEFAULT_MIN_SCORE: f64 = 0.3;

pub const DEFAULT_VERIFICATION_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

pub const DEFAULT_ORIGIN_DOMAIN: &str = "051205.xyz";

pub const DEFAULT_SERVER_PORT: u16 = 9000;

pub const DEFAULT_SECRETS_DIR: &str = "/run/secrets";

pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

pub const DEFAULT_AUDIO_FORMAT: &str = "mp3";
pub const DEFAULT_AUDIO_BITRATE: &str = "320k";
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 48_000;

pub const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_TIMEOUT_SECONDS: u64 = 30;
