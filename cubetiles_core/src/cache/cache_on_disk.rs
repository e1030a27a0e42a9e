use super::traits::{Cache, CacheKey, CacheValue};
use anyhow::Result;
use std::{
	fmt::Debug,
	fs::{File, OpenOptions, create_dir_all, remove_dir_all, remove_file, write},
	io::{Cursor, Read, Write},
	marker::PhantomData,
	path::{Path, PathBuf},
};

pub struct OnDiskCache<K: CacheKey, V: CacheValue> {
	path: PathBuf, // path to cache directory
	_marker_k: PhantomData<K>,
	_marker_v: PhantomData<V>,
}

#[allow(clippy::new_without_default)]
impl<K: CacheKey, V: CacheValue> OnDiskCache<K, V> {
	pub fn new(path: PathBuf) -> Self {
		create_dir_all(&path).ok();
		Self {
			path,
			_marker_k: PhantomData,
			_marker_v: PhantomData,
		}
	}

	fn get_entry_path(&self, key: &K) -> PathBuf {
		// ensure the name is a valid file name by replacing all non unix path characters with '%' followed by the hexadecimal
		let name = key
			.to_cache_key()
			.bytes()
			.map(|b| {
				if (b as char).is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-' || b == b',' {
					(b as char).to_string()
				} else {
					format!("%{:02x}", b)
				}
			})
			.collect::<String>();
		let mut p = self.path.clone();
		p.push(format!("{}.tmp", name));
		p
	}

	/// Values are framed as `u64` little-endian length prefix + `to_cache_buffer()` bytes, since
	/// `CacheValue` buffers don't self-delimit and a disk entry holds a `Vec<V>`.
	fn buffer_to_values(buf: &[u8]) -> Result<Vec<V>> {
		let mut reader = Cursor::new(buf);
		let mut vec = Vec::new();
		while reader.position() < buf.len() as u64 {
			let mut len_bytes = [0u8; 8];
			reader.read_exact(&mut len_bytes)?;
			let len = u64::from_le_bytes(len_bytes) as usize;
			let mut value_bytes = vec![0u8; len];
			reader.read_exact(&mut value_bytes)?;
			vec.push(V::from_cache_buffer(&value_bytes));
		}
		Ok(vec)
	}

	fn values_to_buffer(values: Vec<V>) -> Result<Vec<u8>> {
		let mut buf = Vec::new();
		for value in values {
			let bytes = value.to_cache_buffer();
			buf.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
			buf.extend_from_slice(&bytes);
		}
		Ok(buf)
	}

	fn read_file(&self, entry_path: &Path) -> Result<Option<Vec<V>>> {
		if entry_path.exists() {
			let mut file = File::open(entry_path)?;
			let mut data = Vec::new();
			file.read_to_end(&mut data)?;
			Ok(Some(Self::buffer_to_values(&data)?))
		} else {
			Ok(None)
		}
	}
}

impl<K: CacheKey, V: CacheValue> Cache<K, V> for OnDiskCache<K, V> {
	fn contains_key(&self, key: &K) -> bool {
		self.get_entry_path(key).exists()
	}

	fn get_clone(&self, key: &K) -> Result<Option<Vec<V>>> {
		self.read_file(&self.get_entry_path(key))
	}

	fn remove(&mut self, key: &K) -> Result<Option<Vec<V>>> {
		let entry_path = self.get_entry_path(key);
		let values = self.read_file(&entry_path)?;
		if entry_path.exists() {
			remove_file(&entry_path)?;
		}
		Ok(values)
	}

	fn insert(&mut self, key: &K, values: Vec<V>) -> Result<()> {
		let entry_path = self.get_entry_path(key);
		write(entry_path, Self::values_to_buffer(values)?)?;
		Ok(())
	}

	fn append(&mut self, key: &K, values: Vec<V>) -> Result<()> {
		let entry_path = self.get_entry_path(key);
		let buffer = Self::values_to_buffer(values)?;
		if entry_path.exists() {
			OpenOptions::new().append(true).open(entry_path)?.write_all(&buffer)?;
		} else {
			write(entry_path, buffer)?;
		}
		Ok(())
	}

	fn clean_up(&mut self) {
		remove_dir_all(&self.path).ok();
	}
}

impl<K: CacheKey, V: CacheValue> Debug for OnDiskCache<K, V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OnDiskCache").field("path", &self.path).finish()
	}
}
