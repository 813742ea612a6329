use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::{fs, io};

use log::debug;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ConfigError {
    #[error("Failed to load {0}. error: {1}")]
    LoadFileError(PathBuf, io::ErrorKind),
    #[error(transparent)]
    TomlParseError(#[from] toml::de::Error),
}

/// 入力ファイルの形式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum InputFormat {
    /// バイナリそのまま
    #[default]
    Binary,

    /// 16進文字列(空白・改行は無視)
    Hex,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct Config {
    /// 入力ファイルの形式
    /// デフォルトはバイナリ
    #[serde(default)]
    pub(crate) format: InputFormat,

    /// 入力を分割する断片のサイズ(バイト)
    /// 0は指定できない。デフォルトは1500バイト
    #[serde(default = "Config::default_segment_size")]
    pub(crate) segment_size: NonZeroUsize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: InputFormat::default(),
            segment_size: Self::default_segment_size(),
        }
    }
}

impl Config {
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFileError(path.to_path_buf(), e.kind()))?;
        Ok(toml::from_str(&content)?)
    }

    /// 設定ファイルが存在しない場合はデフォルト値を使用する
    pub(crate) fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::LoadFileError(path, io::ErrorKind::NotFound)) => {
                debug!("{} not found, using default config", path.display());
                Ok(Self::default())
            }
            result => result,
        }
    }

    /// デフォルトの断片サイズ
    const fn default_segment_size() -> NonZeroUsize {
        const DEFAULT_SEGMENT_SIZE: NonZeroUsize = NonZeroUsize::new(1500).unwrap();
        DEFAULT_SEGMENT_SIZE
    }
}
