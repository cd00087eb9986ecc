//! Entry point for glengine.
//! Logging + CLI flags, then hand over to the platform event loop.

use std::path::PathBuf;

use anyhow::Result;
use platform::{AppConfig, AssemblyMode, Backends, NgonPolicy, VertexPacking};

fn parse_backend(val: &str) -> Backends {
    // Accept: auto|vulkan|dx12|metal|gl
    match val.to_ascii_lowercase().as_str() {
        "auto" => Backends::all(),
        "vulkan" | "vk" => Backends::VULKAN,
        "dx12" | "d3d12" => Backends::DX12,
        "metal" | "mtl" => Backends::METAL,
        "gl" | "opengl" | "gles" => Backends::GL,
        other => {
            log::warn!("Unknown backend '{other}', falling back to auto.");
            Backends::all()
        }
    }
}

fn parse_on_off(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

fn parse_packing(val: &str) -> Option<VertexPacking> {
    match val.to_ascii_lowercase().as_str() {
        "interleaved" | "aos" => Some(VertexPacking::Interleaved),
        "planar" | "soa" => Some(VertexPacking::Planar),
        _ => None,
    }
}

/// Build the config from command-line arguments (program name excluded).
/// Unknown or unparsable flags are logged and ignored.
fn parse_args(args: &[String]) -> AppConfig {
    let mut cfg = AppConfig::default();
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        let arg = arg.as_str();
        if let Some(v) = arg.strip_prefix("--gpu-backend=") {
            cfg.backends = parse_backend(v);
        } else if arg == "--show-fps" {
            cfg.show_fps = true;
        } else if let Some(v) = arg.strip_prefix("--show-fps=") {
            cfg.show_fps = parse_on_off(v);
        } else if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            w = v.parse().ok().or(w);
        } else if let Some(v) = arg.strip_prefix("--height=") {
            h = v.parse().ok().or(h);
        } else if let Some(v) = arg.strip_prefix("--models-dir=") {
            cfg.models_dir = PathBuf::from(v);
        } else if let Some(v) = arg.strip_prefix("--model=") {
            cfg.initial_model = Some(v.to_owned());
        } else if let Some(v) = arg.strip_prefix("--packing=") {
            match parse_packing(v) {
                Some(p) => cfg.packing = p,
                None => log::warn!("Unknown packing '{v}', keeping {:?}.", cfg.packing),
            }
        } else if arg == "--dedup" {
            cfg.load.assembly = AssemblyMode::Deduplicated;
        } else if arg == "--fan-ngons" {
            cfg.load.ngon = NgonPolicy::Fan;
        } else {
            log::warn!("Ignoring unknown argument '{arg}'");
        }
    }

    cfg.width = w.unwrap_or(cfg.width).max(1);
    cfg.height = h.unwrap_or(cfg.height).max(1);
    cfg
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = parse_args(&args);
    log::info!(
        "Starting glengine. Backend: {:?}, show_fps={}, window_size={}x{}, models={}",
        config.backends,
        config.show_fps,
        config.width,
        config.height,
        config.models_dir.display()
    );

    platform::run_with_renderer(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_flags() {
        let cfg = parse_args(&[]);
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.models_dir, PathBuf::from(platform::DEFAULT_MODELS_DIR));
        assert_eq!((cfg.width, cfg.height), (1280, 720));
    }

    #[test]
    fn size_and_backend_flags() {
        let cfg = parse_args(&args(&["--gpu-backend=Vulkan", "--size=800x600", "--height=0"]));
        assert_eq!(cfg.backends, Backends::VULKAN);
        assert_eq!((cfg.width, cfg.height), (800, 1));

        let cfg = parse_args(&args(&["--size=bogus", "--width=640"]));
        assert_eq!((cfg.width, cfg.height), (640, 720));

        let cfg = parse_args(&args(&["--gpu-backend=voodoo"]));
        assert_eq!(cfg.backends, Backends::all());
    }

    #[test]
    fn show_fps_forms() {
        assert!(parse_args(&args(&["--show-fps"])).show_fps);
        assert!(parse_args(&args(&["--show-fps=on"])).show_fps);
        assert!(!parse_args(&args(&["--show-fps=off"])).show_fps);
    }

    #[test]
    fn mesh_flags() {
        let cfg = parse_args(&args(&[
            "--models-dir=assets/models",
            "--model=bunny.obj",
            "--packing=planar",
            "--dedup",
            "--fan-ngons",
        ]));
        assert_eq!(cfg.models_dir, PathBuf::from("assets/models"));
        assert_eq!(cfg.initial_model.as_deref(), Some("bunny.obj"));
        assert_eq!(cfg.packing, VertexPacking::Planar);
        assert_eq!(cfg.load.assembly, AssemblyMode::Deduplicated);
        assert_eq!(cfg.load.ngon, NgonPolicy::Fan);

        let cfg = parse_args(&args(&["--packing=sideways"]));
        assert_eq!(cfg.packing, VertexPacking::Interleaved);
    }
}
