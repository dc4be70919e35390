//! ying-cli - Ying 视频编解码器命令行工具
//!
//! 读取原始 Gray8 帧序列 (或生成合成序列), 编码后用独立解码器重建,
//! 校验闭环一致性并输出逐帧熵与 PSNR 统计.

mod logging;
mod rawio;
mod synthetic;

use clap::Parser;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info, warn};

use ying_codec::{DecodingPipeline, EncoderParams, EncodingPipeline, FrameStats, FrameType, psnr};
use ying_core::{FrameSource, YingError, YingResult};

use rawio::{RawGray8Reader, RawGray8Writer};
use synthetic::SyntheticSequence;

/// 合成序列的默认尺寸
const DEFAULT_SYNTHETIC_SIZE: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "ying-cli", version, about = "Ying 灰度视频编解码工具")]
struct Cli {
    /// 输入原始 Gray8 文件 (连续帧, 无文件头)
    #[arg(short, long, requires_all = ["width", "height"])]
    input: Option<PathBuf>,

    /// 帧宽度 (像素)
    #[arg(long)]
    width: Option<usize>,

    /// 帧高度 (像素)
    #[arg(long)]
    height: Option<usize>,

    /// 生成 N 帧合成序列代替输入文件
    #[arg(long, conflicts_with = "input")]
    synthetic: Option<u64>,

    /// 编码参数 JSON 文件
    #[arg(long)]
    params: Option<PathBuf>,

    /// 量化比例
    #[arg(long)]
    scale: Option<f64>,

    /// 运动估计块尺寸
    #[arg(long = "motion-block")]
    motion_block: Option<usize>,

    /// DCT 块尺寸
    #[arg(long = "dct-block")]
    dct_block: Option<usize>,

    /// 运动搜索半径 (默认 2 倍运动块尺寸)
    #[arg(long)]
    radius: Option<usize>,

    /// 输出解码后的原始 Gray8 帧
    #[arg(long = "output-raw")]
    output_raw: Option<PathBuf>,

    /// 覆盖输出文件
    #[arg(short = 'y', long)]
    overwrite: bool,

    /// 日志目录
    #[arg(long = "log-dir", default_value = "logs")]
    log_dir: PathBuf,

    /// 控制台只输出警告和错误
    #[arg(short, long)]
    quiet: bool,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// 整个序列的汇总
#[derive(Debug, Default)]
struct Summary {
    frames: u64,
    intra: u64,
    predicted: u64,
    mismatches: u64,
    estimated_bits: f64,
    raw_bits: f64,
    psnr_sum: f64,
    lossless: u64,
}

impl Summary {
    fn record(&mut self, stats: &FrameStats, bits: f64, raw_bits: f64, quality: f64) {
        self.frames += 1;
        match stats.frame_type {
            FrameType::Intra => self.intra += 1,
            FrameType::Predicted => self.predicted += 1,
        }
        self.estimated_bits += bits;
        self.raw_bits += raw_bits;
        if quality.is_finite() {
            self.psnr_sum += quality;
        } else {
            self.lossless += 1;
        }
    }

    /// 有限 PSNR 帧的平均值
    fn mean_psnr(&self) -> Option<f64> {
        let lossy = self.frames - self.lossless;
        (lossy > 0).then(|| self.psnr_sum / lossy as f64)
    }
}

fn main() {
    let cli = Cli::parse();

    let mut log_config = logging::LogConfig::new("ying-cli", cli.verbose);
    log_config.dir = cli.log_dir.clone();
    log_config.quiet = cli.quiet;
    if let Err(e) = logging::init(&log_config) {
        eprintln!("错误: 无法初始化日志: {e}");
        process::exit(1);
    }

    if cli.input.is_none() && cli.synthetic.is_none() {
        print_banner();
        return;
    }

    match run(&cli) {
        Ok(summary) => print_summary(&summary),
        Err(e) => {
            eprintln!("错误: {e}");
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> YingResult<Summary> {
    let params = load_params(cli)?;
    debug!("编码参数: {params:?}");

    let mut source = open_source(cli)?;
    let mut writer = match &cli.output_raw {
        Some(path) => Some(create_output(path, cli.overwrite)?),
        None => None,
    };

    let mut encoder = EncodingPipeline::new(params.clone())?;
    let mut decoder = DecodingPipeline::new(params)?;
    let mut summary = Summary::default();

    while let Some(frame) = source.next_frame()? {
        let index = encoder.frame_index();
        let encoded = encoder.encode_next(&frame)?;
        let decoded = decoder.decode_next(&encoded)?;

        if encoder.reconstructed() != Some(&decoded) {
            summary.mismatches += 1;
            warn!("帧 #{index}: 解码结果与编码端重建帧不一致");
        }

        let stats = FrameStats::measure(index, &frame, &encoded);
        let bits = stats.estimated_bits(&encoded);
        let raw_bits = (frame.as_slice().len() * 8) as f64;
        let quality = psnr(&frame, &decoded);
        info!(
            "帧 #{index} [{}] 原始熵 {:.3}, 系数熵 {:.3}, 运动熵 {:.3}, 估算 {:.0} bit, PSNR {:.2} dB",
            stats.frame_type,
            stats.original_entropy,
            stats.coefficient_entropy,
            stats.motion_entropy,
            bits,
            quality,
        );
        summary.record(&stats, bits, raw_bits, quality);

        if let Some(w) = writer.as_mut() {
            w.write_frame(&decoded)?;
        }
    }

    if let Some(w) = writer {
        let written = w.frames_written();
        w.finish()?;
        debug!("已写出 {written} 帧解码输出");
    }
    Ok(summary)
}

/// 参数优先级: 命令行 > JSON 文件 > 默认值
fn load_params(cli: &Cli) -> YingResult<EncoderParams> {
    let mut params = match &cli.params {
        Some(path) => {
            let reader = BufReader::new(File::open(path)?);
            serde_json::from_reader(reader).map_err(|e| {
                YingError::InvalidArgument(format!("参数文件 '{}' 解析失败: {e}", path.display()))
            })?
        }
        None => EncoderParams::default(),
    };
    if let Some(size) = cli.motion_block {
        params = params.with_motion_block_size(size);
    }
    if let Some(size) = cli.dct_block {
        params = params.with_dct_block_size(size);
    }
    if let Some(scale) = cli.scale {
        params = params.with_quant_scale(scale);
    }
    if let Some(radius) = cli.radius {
        params = params.with_search_radius(radius);
    }
    params.validate()?;
    Ok(params)
}

fn open_source(cli: &Cli) -> YingResult<Box<dyn FrameSource>> {
    if let Some(path) = &cli.input {
        let (width, height) = match (cli.width, cli.height) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                return Err(YingError::InvalidArgument(
                    "读取原始文件需要 --width 和 --height".into(),
                ));
            }
        };
        eprintln!("输入: {} ({width}x{height} Gray8)", path.display());
        let reader = BufReader::new(File::open(path)?);
        return Ok(Box::new(RawGray8Reader::new(reader, width, height)?));
    }

    let frames = cli.synthetic.unwrap_or(0);
    let width = cli.width.unwrap_or(DEFAULT_SYNTHETIC_SIZE);
    let height = cli.height.unwrap_or(DEFAULT_SYNTHETIC_SIZE);
    eprintln!("输入: 合成序列 {frames} 帧 ({width}x{height})");
    Ok(Box::new(SyntheticSequence::new(width, height, frames)))
}

fn create_output(path: &Path, overwrite: bool) -> YingResult<RawGray8Writer<BufWriter<File>>> {
    if !overwrite && path.exists() {
        return Err(YingError::InvalidArgument(format!(
            "输出文件已存在 '{}', 使用 -y 覆盖",
            path.display()
        )));
    }
    eprintln!("输出: {}", path.display());
    Ok(RawGray8Writer::new(BufWriter::new(File::create(path)?)))
}

fn print_summary(summary: &Summary) {
    eprintln!(
        "完成: {} 帧 (I {}, P {})",
        summary.frames, summary.intra, summary.predicted
    );
    if summary.raw_bits > 0.0 {
        eprintln!(
            "估算压缩比: {:.2}:1 ({:.0} / {:.0} bit)",
            summary.raw_bits / summary.estimated_bits.max(1.0),
            summary.estimated_bits,
            summary.raw_bits,
        );
    }
    match summary.mean_psnr() {
        Some(p) => eprintln!("平均 PSNR: {p:.2} dB ({} 帧无损)", summary.lossless),
        None => eprintln!("全部帧无损重建"),
    }
    if summary.mismatches > 0 {
        eprintln!("警告: {} 帧编解码结果不一致", summary.mismatches);
    }
}

fn print_banner() {
    eprintln!(
        "ying-cli 版本 {} -- Ying 灰度视频编解码工具",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!("用法: ying-cli --input <文件> --width <宽> --height <高> [选项]");
    eprintln!("      ying-cli --synthetic <帧数> [选项]");
    eprintln!();
    eprintln!("使用 --help 查看所有选项");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ying-cli").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_overrides_apply() {
        let cli = parse(&["--synthetic", "2", "--scale", "2.5", "--radius", "4"]);
        let params = load_params(&cli).unwrap();
        assert_eq!(params.quant_scale, 2.5);
        assert_eq!(params.effective_search_radius(), 4);
    }

    #[test]
    fn test_input_conflicts_with_synthetic() {
        let res = Cli::try_parse_from([
            "ying-cli", "--input", "a.raw", "--width", "8", "--height", "8", "--synthetic", "2",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_synthetic_run_is_consistent() {
        let cli = parse(&["--synthetic", "3", "--width", "32", "--height", "32"]);
        let summary = run(&cli).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.intra, 1);
        assert_eq!(summary.predicted, 2);
        assert_eq!(summary.mismatches, 0);
    }

    #[test]
    fn test_bad_scale_rejected() {
        let cli = parse(&["--synthetic", "1", "--scale", "0"]);
        assert!(matches!(load_params(&cli), Err(YingError::InvalidArgument(_))));
    }
}
