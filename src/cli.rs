use std::net::Ipv6Addr;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[clap(about = "Compute and verify Internet checksums (RFC 1071)")]
pub(crate) struct Cli {
    #[clap(long, short, default_value = "./config.toml")]
    pub(crate) config: PathBuf,

    /// 入力を分割する断片のサイズ(設定ファイルの値を上書き)
    #[clap(long)]
    pub(crate) segment_size: Option<NonZeroUsize>,

    #[clap(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub(crate) enum Command {
    /// 指定範囲の1の補数和とチェックサムを表示
    Sum {
        file: PathBuf,

        #[clap(long, default_value_t = 0)]
        offset: usize,

        /// 省略時はオフセット以降すべて
        #[clap(long)]
        size: Option<usize>,

        #[clap(long, default_value_t = 0)]
        initial: u16,
    },

    /// ICMPv4メッセージ(ヘッダー + データ)のチェックサムを検証
    Icmp { file: PathBuf },

    /// ICMPv6メッセージ(ヘッダー + データ)のチェックサムを検証
    Icmpv6 {
        file: PathBuf,

        #[clap(long)]
        src: Ipv6Addr,

        #[clap(long)]
        dst: Ipv6Addr,
    },
}

impl Cli {
    pub(crate) fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
