//! Bulk block-file generation (C5/C6): pre-generates every tile of a `(dataset, parameter, axis)`
//! triple across the slices that satisfy `pre_generation_sparsity` (§5's bulk-build parallelism).

use anyhow::{Context, Result};
use cubetiles::config::Config;
use cubetiles::raw_backend::RawArrayBackend;
use cubetiles_container::block_file::{BlockFileLayout, block_file_path, build_block_file};
use cubetiles_container::cache::TileGenerationCache;
use cubetiles_container::compressor::CodecMode;
use cubetiles_container::source::DataSourceProxy;
use cubetiles_container::tile::{encode_tile, extract_tile_window};
use cubetiles_container::types::{DType, DataSource, SliceAxis, TileId, max_lod};
use cubetiles_core::io::DataWriterFile;
use cubetiles_core::progress::get_progress_bar;
use std::fs;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// Path to a YAML configuration file, used for `datasets_root`, `tile_size`,
	/// `pre_generation_sparsity`, and `tolerance`.
	#[arg(short = 'c', long, value_name = "FILE", display_order = 0)]
	pub config: Option<PathBuf>,

	/// Dataset id the generated block files are stored under.
	#[arg(long, display_order = 1)]
	pub dataset_id: String,

	/// Parameter name the generated block files are stored under.
	#[arg(long, display_order = 1)]
	pub parameter: String,

	/// Flat, row-major little-endian `f64` cube file to read from.
	#[arg(long, display_order = 1)]
	pub raw_path: PathBuf,

	/// Cube shape as `Nz,Ny,Nx`.
	#[arg(long, value_parser = parse_shape, display_order = 1)]
	pub shape: (u64, u64, u64),

	/// Which axis to slice along: z, y, or x.
	#[arg(long, value_parser = parse_axis, display_order = 1)]
	pub axis: SliceAxis,

	/// Resample resolution used for padding/downsampling (§4.3.3). Defaults to 1 (no padding).
	#[arg(long, default_value_t = 1, display_order = 2)]
	pub resample_resolution: u32,
}

fn parse_shape(s: &str) -> Result<(u64, u64, u64), String> {
	let parts: Vec<&str> = s.split(',').collect();
	let [a, b, c] = parts.as_slice() else {
		return Err(format!("expected 'Nz,Ny,Nx', got '{s}'"));
	};
	let parse = |p: &str| p.parse::<u64>().map_err(|_| format!("not a number: '{p}'"));
	Ok((parse(a)?, parse(b)?, parse(c)?))
}

fn parse_axis(s: &str) -> Result<SliceAxis, String> {
	match s {
		"z" => Ok(SliceAxis::Z),
		"y" => Ok(SliceAxis::Y),
		"x" => Ok(SliceAxis::X),
		other => Err(format!("unknown axis '{other}', expected z, y, or x")),
	}
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = if let Some(config_path) = &arguments.config {
		Config::from_path(config_path).context("run `cubetiles build --help` for the config file shape")?
	} else {
		Config::default()
	};
	let datasets_root = config.datasets_root().context("pass -c with a config that sets `datasets_root`")?;

	let backend = RawArrayBackend::open(&arguments.raw_path, arguments.shape, None).await?;
	let proxy = DataSourceProxy::new(DataSource::Unlabeled {
		shape: arguments.shape,
		dtype: DType::F64,
		reader: Box::new(backend),
	});

	let layout = BlockFileLayout {
		axis: arguments.axis,
		shape: arguments.shape,
		tile_size: config.tile_size,
		max_lod: max_lod(arguments.shape, config.tile_size),
	};

	let (nz, ny, nx) = arguments.shape;
	let slice_count = match arguments.axis {
		SliceAxis::Z => nz,
		SliceAxis::Y => ny,
		SliceAxis::X => nx,
	};
	let slices: Vec<u64> = (0..slice_count).step_by(config.pre_generation_sparsity.max(1) as usize).collect();

	// C6: survives a build that's interrupted partway, and tiles generated but not yet flushed
	// to a block file don't need regenerating on the next run.
	let mut generation_cache = TileGenerationCache::new(&config.cache);

	let mut progress = get_progress_bar("building block files", slices.len() as u64);
	for (i, &slice_index) in slices.iter().enumerate() {
		build_one_slice(
			&proxy,
			&layout,
			&config,
			&mut generation_cache,
			datasets_root,
			&arguments.dataset_id,
			&arguments.parameter,
			slice_index,
			arguments.resample_resolution,
		)
		.await
		.with_context(|| format!("building block file for slice {slice_index}"))?;
		progress.set_position(i as u64 + 1);
	}
	progress.finish();

	Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn build_one_slice(
	proxy: &DataSourceProxy,
	layout: &BlockFileLayout,
	config: &Config,
	generation_cache: &mut TileGenerationCache,
	datasets_root: &std::path::Path,
	dataset_id: &str,
	parameter: &str,
	slice_index: u64,
	resample_resolution: u32,
) -> Result<()> {
	for lod in 0..=layout.max_lod {
		let (gw, gh) = layout.grid_dims(lod);
		for y in 0..gh {
			for x in 0..gw {
				let tile_id = TileId::new(dataset_id, parameter, layout.axis, slice_index, lod, x, y);
				if generation_cache.contains(&tile_id) {
					continue;
				}
				let window = extract_tile_window(proxy, layout.axis, slice_index, lod, x, y, layout.tile_size, resample_resolution).await?;
				let tolerance = config.tolerance.tolerance_for(&tile_id);
				let blob = encode_tile(&window, layout.tile_size, resample_resolution, CodecMode::Lossy, tolerance)?;
				generation_cache.insert(&tile_id, &blob)?;
			}
		}
	}

	let path = block_file_path(datasets_root, dataset_id, parameter, layout.axis, slice_index);
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).with_context(|| format!("creating block file directory '{}'", parent.display()))?;
	}
	let mut writer = DataWriterFile::from_path(&path).with_context(|| format!("opening block file '{}' for writing", path.display()))?;
	build_block_file(&mut writer, layout, |lod, x, y| {
		let tile_id = TileId::new(dataset_id, parameter, layout.axis, slice_index, lod, x, y);
		generation_cache
			.get(&tile_id)?
			.ok_or_else(|| anyhow::anyhow!("tile {tile_id} missing from the generation cache"))
	})
}
