//! HTTP handlers: widget-mode tile dispatch (§4.7, §6), standalone-mode block-file reads
//! (§4.5, §6), and the request-group progress WebSocket (§6, §9(c)).
//!
//! Both dispatch handlers frame their response the same way: a little-endian `u32` byte length,
//! the JSON header of that length, then the concatenated tile bytes in request order. This
//! mirrors the length-prefixed conventions the tile and block-file wire formats already use
//! instead of introducing a separate multipart scheme.

use super::state::{ActiveSource, ProgressFrame, TileServerState};
use anyhow::{Context, Result, bail};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path as AxumPath, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use cubetiles_container::block_file::{self, BlockFileLayout};
use cubetiles_container::compressor::CodecMode;
use cubetiles_container::error::TileError;
use cubetiles_container::metadata::MetadataStore;
use cubetiles_container::tile::{encode_tile, extract_tile_window, TileWindow};
use cubetiles_container::types::{max_lod, SliceAxis, TileId};
use cubetiles_core::io::DataReaderFile;
use cubetiles_core::types::Blob;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Converts a fallible handler body into a response, downcasting [`TileError`] to its HTTP
/// status per §7's propagation policy.
fn to_response(result: Result<Response>) -> Response {
	match result {
		Ok(response) => response,
		Err(err) => {
			let status = match err.downcast_ref::<TileError>() {
				Some(TileError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
				Some(TileError::SourceReadFailed { .. }) => StatusCode::BAD_GATEWAY,
				Some(TileError::StorageCorruption(_) | TileError::TileFormatError(_) | TileError::CodecError(_)) => {
					StatusCode::INTERNAL_SERVER_ERROR
				}
				None => StatusCode::INTERNAL_SERVER_ERROR,
			};
			(status, format!("{err:#}")).into_response()
		}
	}
}

fn frame_response(header_value: &impl Serialize, binary: &[u8]) -> Result<Response> {
	let header_bytes = serde_json::to_vec(header_value).context("serializing response header")?;
	let mut body = Vec::with_capacity(4 + header_bytes.len() + binary.len());
	body.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
	body.extend_from_slice(&header_bytes);
	body.extend_from_slice(binary);
	Ok(([(header::CONTENT_TYPE, "application/octet-stream")], body).into_response())
}

pub async fn status() -> &'static str {
	"ready!"
}

// ---- Widget-mode dispatch (§4.7, §6) -------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
struct TileRequestEntry {
	#[serde(rename = "indexDimension")]
	index_dimension: String,
	#[serde(rename = "indexValue")]
	index_value: u64,
	lod: u32,
	xys: Vec<(u64, u64)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WidgetTileRequest {
	request_data: Vec<TileRequestEntry>,
	#[serde(default)]
	group_id: Option<u64>,
}

#[derive(Debug, Serialize)]
struct WidgetTileResponse {
	response_type: &'static str,
	metadata: Value,
	#[serde(rename = "dataSizes")]
	data_sizes: Vec<u32>,
}

pub async fn serve_widget_tiles(State(state): State<Arc<TileServerState>>, Json(request): Json<WidgetTileRequest>) -> Response {
	to_response(serve_widget_tiles_inner(state, request).await)
}

async fn serve_widget_tiles_inner(state: Arc<TileServerState>, request: WidgetTileRequest) -> Result<Response> {
	let Some(active) = state.active_source.load_full() else {
		bail!(TileError::InvalidInput("no active source is configured".to_string()));
	};

	let total: u64 = request.request_data.iter().map(|entry| entry.xys.len() as u64).sum();
	let group_id = request.group_id.unwrap_or_else(|| state.register_progress_group().0);

	let resample_resolution = resample_resolution_for(&state.metadata, &active.dataset_id, &active.parameter)?;

	let mut done = 0u64;
	let mut failed = 0u64;
	let mut data_sizes = Vec::new();
	let mut binary = Vec::new();

	for entry in &request.request_data {
		let axis = SliceAxis::from_index_dimension(&entry.index_dimension)
			.ok_or_else(|| TileError::InvalidInput(format!("unknown indexDimension '{}'", entry.index_dimension)))?;

		for &(tx, ty) in &entry.xys {
			let tile_id = TileId::new(active.dataset_id.clone(), active.parameter.clone(), axis, entry.index_value, entry.lod, tx, ty);

			let blob = match state.tile_cache.get(&tile_id) {
				Some(blob) => blob,
				None => match generate_tile(&state, &active, &tile_id, resample_resolution).await {
					Ok(blob) => {
						state.tile_cache.insert(&tile_id, blob.clone());
						blob
					}
					Err(err) => {
						log::warn!("tile {tile_id} failed to generate, synthesizing a NaN tile: {err:#}");
						failed += 1;
						nan_tile_blob(state.tile_size, resample_resolution)?
					}
				},
			};

			data_sizes.push(blob.len() as u32);
			binary.extend_from_slice(blob.as_slice());
			done += 1;
			state.publish_progress(group_id, ProgressFrame { done, total, failed });
		}
	}

	let metadata = serde_json::to_value(&request.request_data).context("serializing echoed request metadata")?;
	frame_response(
		&WidgetTileResponse {
			response_type: "tile_data",
			metadata,
			data_sizes,
		},
		&binary,
	)
}

async fn generate_tile(state: &TileServerState, active: &ActiveSource, tile_id: &TileId, resample_resolution: u32) -> Result<Blob> {
	let window = extract_tile_window(
		&active.proxy,
		tile_id.slice_axis,
		tile_id.slice_index,
		tile_id.lod,
		tile_id.tx,
		tile_id.ty,
		state.tile_size,
		resample_resolution,
	)
	.await?;
	let tolerance = state.tolerance.tolerance_for(tile_id);
	encode_tile(&window, state.tile_size, resample_resolution, CodecMode::Lossy, tolerance)
}

fn nan_tile_blob(tile_size: u64, resample_resolution: u32) -> Result<Blob> {
	let t = tile_size as usize;
	let window = TileWindow {
		values: vec![f64::NAN; t * t],
		height: t,
		width: t,
	};
	encode_tile(&window, tile_size, resample_resolution, CodecMode::Lossless, 1.0)
}

fn resample_resolution_for(metadata: &MetadataStore, dataset_id: &str, parameter: &str) -> Result<u32> {
	Ok(metadata.load_parameter(dataset_id, parameter)?.map_or(1, |p| p.resample_resolution))
}

// ---- Standalone-mode block-file reads (§4.5, §6) -------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BlockQuery {
	lod: u32,
	xys: String,
}

#[derive(Debug, Serialize)]
struct BlockResponse {
	response_type: &'static str,
	metadata: Value,
	#[serde(rename = "dataSizes")]
	data_sizes: Vec<u32>,
}

pub async fn serve_block(
	State(state): State<Arc<TileServerState>>,
	AxumPath((dataset_id, parameter, axis, slice_index)): AxumPath<(String, String, String, u64)>,
	Query(query): Query<BlockQuery>,
) -> Response {
	to_response(serve_block_inner(state, dataset_id, parameter, axis, slice_index, query).await)
}

async fn serve_block_inner(
	state: Arc<TileServerState>,
	dataset_id: String,
	parameter: String,
	axis: String,
	slice_index: u64,
	query: BlockQuery,
) -> Result<Response> {
	if slice_index % state.pre_generation_sparsity != 0 {
		bail!(TileError::InvalidInput(format!(
			"slice {slice_index} is not a multiple of pre_generation_sparsity {}",
			state.pre_generation_sparsity
		)));
	}

	let axis = parse_axis(&axis)?;
	let xys = parse_xys(&query.xys)?;

	let dataset = state
		.metadata
		.load_dataset(&dataset_id)?
		.ok_or_else(|| TileError::InvalidInput(format!("unknown dataset '{dataset_id}'")))?;
	let shape = (dataset.z_max, dataset.y_max, dataset.x_max);
	let layout = BlockFileLayout {
		axis,
		shape,
		tile_size: state.tile_size,
		max_lod: max_lod(shape, state.tile_size),
	};

	let path = block_file::block_file_path(&state.datasets_root, &dataset_id, &parameter, axis, slice_index);
	let reader = DataReaderFile::open(&path).with_context(|| format!("opening block file '{}'", path.display()))?;
	let (bytes, sizes) = block_file::read_tiles(reader.as_ref(), &layout, query.lod, &xys).await?;

	let metadata = serde_json::json!({
		"dataset": dataset_id,
		"parameter": parameter,
		"axis": axis.name(),
		"slice": slice_index,
		"lod": query.lod,
	});
	frame_response(
		&BlockResponse {
			response_type: "tile_data",
			metadata,
			data_sizes: sizes,
		},
		bytes.as_slice(),
	)
}

fn parse_axis(axis: &str) -> Result<SliceAxis> {
	match axis {
		"z" => Ok(SliceAxis::Z),
		"y" => Ok(SliceAxis::Y),
		"x" => Ok(SliceAxis::X),
		other => bail!(TileError::InvalidInput(format!("unknown axis '{other}'"))),
	}
}

/// Parses the `xys` query parameter: `"x,y;x,y;..."`.
fn parse_xys(raw: &str) -> Result<Vec<(u64, u64)>> {
	raw
		.split(';')
		.filter(|s| !s.is_empty())
		.map(|pair| {
			let (x, y) = pair
				.split_once(',')
				.ok_or_else(|| TileError::InvalidInput(format!("malformed xys entry '{pair}'")))?;
			let x: u64 = x.parse().map_err(|_| TileError::InvalidInput(format!("malformed x in '{pair}'")))?;
			let y: u64 = y.parse().map_err(|_| TileError::InvalidInput(format!("malformed y in '{pair}'")))?;
			Ok((x, y))
		})
		.collect::<Result<Vec<_>, TileError>>()
		.map_err(anyhow::Error::from)
}

// ---- Progress group allocation + push (§6, §9(c)) ------------------------------------------

#[derive(Debug, Serialize)]
struct GroupAllocation {
	group_id: u64,
}

pub async fn allocate_progress_group(State(state): State<Arc<TileServerState>>) -> Response {
	let (group_id, _rx) = state.register_progress_group();
	Json(GroupAllocation { group_id }).into_response()
}

pub async fn progress_websocket(
	State(state): State<Arc<TileServerState>>,
	AxumPath(group_id): AxumPath<u64>,
	ws: WebSocketUpgrade,
) -> Response {
	let Some(rx) = state.subscribe_progress(group_id) else {
		return (StatusCode::NOT_FOUND, "no such progress group").into_response();
	};
	ws.on_upgrade(move |socket| push_progress(socket, rx))
}

async fn push_progress(mut socket: WebSocket, mut rx: tokio::sync::broadcast::Receiver<ProgressFrame>) {
	loop {
		match rx.recv().await {
			Ok(frame) => {
				let Ok(text) = serde_json::to_string(&ProgressMessage::from(frame)) else { continue };
				if socket.send(Message::Text(text.into())).await.is_err() {
					break;
				}
				if frame.done >= frame.total {
					break;
				}
			}
			Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
			Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
		}
	}
}

#[derive(Serialize)]
struct ProgressMessage {
	progress: [u64; 3],
}

impl From<ProgressFrame> for ProgressMessage {
	fn from(frame: ProgressFrame) -> Self {
		ProgressMessage {
			progress: [frame.done, frame.total, frame.failed],
		}
	}
}
