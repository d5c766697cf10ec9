//! Canvas Uploader CLI
//!
//! Usage:
//!   canvas-uploader layout --count <N> --width <W> --height <H> [--verbose]
//!   canvas-uploader workspaces --token <TOKEN>
//!   canvas-uploader upload --token <TOKEN> --workspace <ID> [OPTIONS] <FILES>...
//!
//! Set `RUST_LOG` to change the log level (default: info).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};

use canvas_uploader::metadata::GenerationParams;
use canvas_uploader::remote::http::ApiClient;
use canvas_uploader::{
    GeneratedImage, GenerationType, GridLayout, ImageSize, UploadBatch, UploadError, UploadSettings,
    Uploader,
};

#[derive(Parser)]
#[command(name = "canvas-uploader")]
#[command(about = "Upload image generation batches to a canvas workspace")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the grid layout for a batch without uploading anything
    Layout {
        /// Number of images in the batch
        #[arg(short, long)]
        count: usize,

        #[arg(long, default_value_t = 512)]
        width: u32,

        #[arg(long, default_value_t = 512)]
        height: u32,

        /// Reserve room for the extended data panel
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the workspaces the token can upload into
    Workspaces {
        /// Access token of the signed-in user
        #[arg(short, long)]
        token: String,

        /// Settings file (TOML format)
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },

    /// Upload PNG files as one generated batch
    Upload {
        /// Access token of the signed-in user
        #[arg(short, long)]
        token: String,

        /// Destination workspace id
        #[arg(short, long)]
        workspace: String,

        /// Settings file (TOML format)
        #[arg(short, long)]
        settings: Option<PathBuf>,

        #[arg(short, long, default_value = "")]
        prompt: String,

        /// Generation infotext shown in the data panel
        #[arg(short, long)]
        infotext: Option<String>,

        /// Seed of the first image; later images count up from it
        #[arg(long, default_value_t = 0)]
        seed: i64,

        #[arg(long, default_value_t = 512)]
        width: u32,

        #[arg(long, default_value_t = 512)]
        height: u32,

        /// Generated images, in upload order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Layout {
            count,
            width,
            height,
            verbose,
        } => print_layout(count, ImageSize::new(width, height), verbose),
        Command::Workspaces { token, settings } => {
            let settings = load_settings(settings.as_deref());
            let client = match ApiClient::new(&settings.service, token) {
                Ok(c) => c,
                Err(e) => fail(&UploadError::from(e)),
            };
            match client.list_workspaces() {
                Ok(workspaces) => {
                    for ws in workspaces {
                        println!("{}", ws.display_name());
                    }
                }
                Err(e) => fail(&UploadError::from(e)),
            }
        }
        Command::Upload {
            token,
            workspace,
            settings,
            prompt,
            infotext,
            seed,
            width,
            height,
            files,
        } => {
            let settings = load_settings(settings.as_deref());
            let batch = read_batch(prompt, infotext, seed, ImageSize::new(width, height), &files);
            upload(&settings, token, &workspace, &batch);
        }
    }
}

fn load_settings(path: Option<&Path>) -> UploadSettings {
    let mut settings = match path {
        Some(path) => match UploadSettings::from_file(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading settings '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => UploadSettings::default(),
    };
    settings.service = settings.service.with_env_overrides();
    settings
}

fn print_layout(count: usize, size: ImageSize, verbose: bool) {
    let layout = match GridLayout::new(count, size, verbose) {
        Ok(l) => l,
        Err(e) => fail(&UploadError::from(e)),
    };

    let canvas = layout.canvas_bounds();
    let grid = layout.grid_bounds();
    println!("grid:   {} columns x {} rows", layout.columns(), layout.rows());
    println!(
        "canvas: x={} y={} width={} height={}",
        canvas.x, canvas.y, canvas.width, canvas.height
    );
    println!(
        "images: x={} y={} width={} height={}",
        grid.x, grid.y, grid.width, grid.height
    );
    for (i, (image, label)) in layout
        .image_bounds()
        .iter()
        .zip(layout.label_bounds())
        .enumerate()
    {
        println!(
            "  #{:<3} image ({}, {})  label ({}, {})",
            i + 1,
            image.x,
            image.y,
            label.x,
            label.y
        );
    }
    let title = layout.top_title_location();
    let data = layout.generation_data_location();
    println!("title:  ({}, {}) width {}", title.x, title.y, title.width);
    println!("data:   ({}, {}) width {}", data.x, data.y, data.width);
    if verbose {
        let infobar = layout.bottom_infobar_location();
        println!(
            "extra:  ({}, {}) width {}",
            infobar.x, infobar.y, infobar.width
        );
    }
}

fn read_batch(
    prompt: String,
    infotext: Option<String>,
    seed: i64,
    image_size: ImageSize,
    files: &[PathBuf],
) -> UploadBatch {
    let infotext = infotext.unwrap_or_else(|| prompt.clone());
    let seeds: Vec<i64> = (seed..).take(files.len()).collect();
    let mut generated = Vec::with_capacity(files.len());
    for (path, seed) in files.iter().zip(&seeds) {
        let png = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        };
        generated.push(GeneratedImage {
            png,
            seed: seed.to_string(),
            subseed: "0".to_string(),
            infotext: infotext.clone(),
        });
    }

    let params = GenerationParams {
        prompt: prompt.clone(),
        width: image_size.width,
        height: image_size.height,
        all_subseeds: vec![0; seeds.len()],
        all_seeds: seeds,
        ..GenerationParams::default()
    };

    UploadBatch {
        generation_type: GenerationType::Txt2Img,
        prompt,
        params,
        infotexts: vec![infotext],
        extended_data: Vec::new(),
        image_size,
        source_images: Vec::new(),
        mask: None,
        generated,
        timestamp: unix_timestamp(),
    }
}

fn unix_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_default()
}

fn upload(settings: &UploadSettings, token: String, workspace: &str, batch: &UploadBatch) {
    let api = match ApiClient::new(&settings.service, token) {
        Ok(api) => api,
        Err(e) => fail(&UploadError::from(e)),
    };
    let user_id = match api.current_user_id() {
        Ok(id) => id,
        Err(e) => fail(&UploadError::from(e)),
    };

    let mut service = api.workspace(workspace);
    let result = Uploader::new(&mut service, settings, user_id).upload(batch);
    match result {
        Ok(report) => {
            println!("Uploaded {} images", report.image_ids.len());
            println!("{}", report.canvas_link(&settings.service, workspace));
        }
        Err(e) => fail(&e),
    }
}

fn fail(error: &UploadError) -> ! {
    eprintln!("Error: {}", error);
    if error.is_authorization_expired() {
        eprintln!("Sign in again to get a fresh token, then retry the upload.");
    }
    std::process::exit(1);
}
