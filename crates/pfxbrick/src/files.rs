//! File system operations and chunked transfers.

use std::path::Path;

use pfxbrick_errors::filesystem::codes;
use pfxbrick_errors::{FileSystemError, PfxError, PfxResult, ValidationError};
use pfxbrick_hid_protocol::file::file_count_from_response;
use pfxbrick_hid_protocol::icd::{
    FILE_NAME_LEN, FILE_READ_CHUNK, FILE_WRITE_CHUNK, FILE_WRITE_FAST_CHUNK,
};
use pfxbrick_hid_protocol::{
    DirEntry, FILE_INVALID_ID, FreeSpace, PFX_AUDIO_FILES_MAX, ResponseReader, requests,
};
use pfxbrick_transport::DeviceChannel;
use tracing::{debug, info, warn};

use crate::filedir::{FileDir, FileSpec};
use crate::session::PfxBrick;

/// How file data is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// `FILE_WRITE` with the file id, 61 bytes per chunk.
    Legacy,
    /// `FILE_WRITE_FAST` to the open file, 62 bytes per chunk.
    Fast,
}

impl WriteMode {
    pub fn chunk_len(self) -> usize {
        match self {
            Self::Legacy => FILE_WRITE_CHUNK,
            Self::Fast => FILE_WRITE_FAST_CHUNK,
        }
    }

    fn request(self, file_id: u8, chunk: &[u8]) -> PfxResult<Vec<u8>> {
        match self {
            Self::Legacy => requests::file_write(file_id, chunk),
            Self::Fast => requests::file_write_fast(chunk),
        }
    }
}

/// Check the status byte at `offset` of a file-system response.
fn fs_status(res: &[u8], offset: usize, op: &'static str) -> PfxResult<u8> {
    let status = ResponseReader::at(res, offset).read_u8()?;
    Ok(FileSystemError::check(op, status)?)
}

impl<C: DeviceChannel> PfxBrick<C> {
    /// Re-read free space, the file count and every directory entry.
    ///
    /// BLE sessions also refresh the notification router's file names.
    ///
    /// # Errors
    ///
    /// Returns a file-system error for a failing status byte and transport
    /// errors as they occur.
    pub async fn refresh_file_dir(&mut self) -> PfxResult<&FileDir> {
        let res = self.channel.transact(&requests::free_space()).await?;
        fs_status(&res, 2, "get free space")?;
        let space = FreeSpace::from_response(&res)?;

        let res = self.channel.transact(&requests::file_count()).await?;
        fs_status(&res, 2, "get file count")?;
        let num_files = file_count_from_response(&res)?;

        let mut dir = FileDir {
            num_files,
            ..FileDir::default()
        };
        dir.set_space(space);
        for index in (1u16..).take(PFX_AUDIO_FILES_MAX) {
            if dir.files.len() >= usize::from(num_files) {
                break;
            }
            let res = self
                .channel
                .transact(&requests::dir_entry_by_index(index))
                .await?;
            fs_status(&res, 2, "get directory entry")?;
            let entry = DirEntry::from_response(&res)?;
            if entry.id != FILE_INVALID_ID {
                dir.files.push(entry);
            }
        }
        if dir.files.len() < usize::from(num_files) {
            warn!(
                expected = num_files,
                found = dir.files.len(),
                "directory listing ended early"
            );
        }
        debug!(files = dir.files.len(), bytes_left = dir.bytes_left, "file directory refreshed");

        self.file_dir = dir;
        self.publish_file_names();
        Ok(&self.file_dir)
    }

    /// Hand the cached id-to-name table to the notification router.
    fn publish_file_names(&self) {
        if let Some(router) = self.channel.notifications() {
            router.set_file_names(self.file_dir.names());
        }
    }

    /// Directory entry of one file, straight from the brick.
    ///
    /// # Errors
    ///
    /// Returns a file-system error if the id is not in use.
    pub async fn get_dir_entry(&mut self, file_id: u8) -> PfxResult<DirEntry> {
        let res = self.channel.transact(&requests::dir_entry_by_id(file_id)).await?;
        fs_status(&res, 2, "get directory entry")?;
        DirEntry::from_response(&res)
    }

    /// Ask the brick for the id of the file called `name`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for names over 32 bytes.
    pub async fn file_id_from_name(&mut self, name: &str) -> PfxResult<Option<u8>> {
        let res = self.channel.transact(&requests::named_file_id(name)?).await?;
        let id = ResponseReader::at(&res, 2).read_u8()?;
        Ok((id != FILE_INVALID_ID).then_some(id))
    }

    /// Resolve a [`FileSpec`] to a file id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::FileNotFound`] for an unknown name.
    pub async fn resolve_file(&mut self, spec: &FileSpec) -> PfxResult<u8> {
        match spec {
            FileSpec::Id(id) => Ok(*id),
            FileSpec::Name(name) => self
                .file_id_from_name(name)
                .await?
                .ok_or_else(|| ValidationError::FileNotFound(name.clone()).into()),
        }
    }

    /// Refresh the directory and return the lowest unused file id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoFreeFileId`] when the directory is full.
    pub async fn find_available_file_id(&mut self) -> PfxResult<u8> {
        self.refresh_file_dir().await?.find_available_file_id()
    }

    /// Write mode supported by the connected firmware.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the ICD revision cannot be read.
    pub async fn write_mode(&mut self) -> PfxResult<WriteMode> {
        Ok(if self.icd_rev().await?.supports_fast_write() {
            WriteMode::Fast
        } else {
            WriteMode::Legacy
        })
    }

    /// Upload `data` as file `file_id` called `name` and verify the CRC32
    /// the brick computes against the local one.
    ///
    /// A failing step aborts the transfer; a partially written file is left
    /// on the brick.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a name over 32 bytes, a file-system
    /// error for a failing status byte or a CRC/size mismatch, and transport
    /// errors as they occur.
    pub async fn put_file(&mut self, file_id: u8, name: &str, data: &[u8]) -> PfxResult<DirEntry> {
        if name.len() > FILE_NAME_LEN {
            return Err(ValidationError::too_long("file name", name.len(), FILE_NAME_LEN).into());
        }
        let size = u32::try_from(data.len())
            .map_err(|e| ValidationError::constraint(format!("file too large: {e}")))?;
        let mode = self.write_mode().await?;
        info!(file_id, name, size, ?mode, "uploading file");

        let res = self
            .channel
            .transact(&requests::file_open_write(file_id, size, name))
            .await?;
        fs_status(&res, 1, "file open")?;

        for chunk in data.chunks(mode.chunk_len()) {
            let res = self.channel.transact(&mode.request(file_id, chunk)?).await?;
            fs_status(&res, 1, "file write")?;
        }

        let res = self.channel.transact(&requests::file_close(file_id)).await?;
        fs_status(&res, 1, "file close")?;

        let local_crc = crc32fast::hash(data);
        self.refresh_file_dir().await?;
        let entry = self
            .file_dir
            .get(file_id)
            .cloned()
            .ok_or_else(|| ValidationError::FileNotFound(format!("0x{file_id:02X}")))?;
        if entry.crc32 != local_crc || entry.size != size {
            warn!(
                file_id,
                local_crc = format_args!("{local_crc:08X}"),
                brick_crc = format_args!("{:08X}", entry.crc32),
                "uploaded file does not verify"
            );
            return Err(FileSystemError::new("file verify", codes::TRANSFER_CRC_MISMATCH).into());
        }
        info!(file_id, crc32 = format_args!("{local_crc:08X}"), "file uploaded and verified");
        Ok(entry)
    }

    /// Upload a host file. The brick-side name defaults to the file name.
    ///
    /// # Errors
    ///
    /// Returns [`PfxError::Io`] if the file cannot be read, plus everything
    /// [`put_file`](Self::put_file) returns.
    pub async fn put_file_from_path(
        &mut self,
        file_id: u8,
        path: &Path,
        name: Option<&str>,
    ) -> PfxResult<DirEntry> {
        let data = tokio::fs::read(path).await.map_err(PfxError::Io)?;
        let fallback = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.put_file(file_id, name.unwrap_or(&fallback), &data).await
    }

    /// Download a file.
    ///
    /// # Errors
    ///
    /// Returns a file-system error for a failing status byte and transport
    /// errors as they occur.
    pub async fn get_file(&mut self, spec: &FileSpec) -> PfxResult<Vec<u8>> {
        let file_id = self.resolve_file(spec).await?;
        let entry = self.get_dir_entry(file_id).await?;
        let size = usize::try_from(entry.size).unwrap_or(usize::MAX);
        info!(file_id, name = %entry.name, size, "downloading file");

        let res = self.channel.transact(&requests::file_open_read(file_id)).await?;
        fs_status(&res, 1, "file open")?;

        let chunk_len = u8::try_from(FILE_READ_CHUNK).unwrap_or(u8::MAX);
        let mut data = Vec::with_capacity(size);
        while data.len() < size {
            let res = self
                .channel
                .transact(&requests::file_read(file_id, chunk_len))
                .await?;
            let count = usize::from(fs_status(&res, 1, "file read")?);
            if count == 0 {
                warn!(file_id, read = data.len(), size, "file ended before its directory size");
                break;
            }
            let mut r = ResponseReader::at(&res, 2);
            data.extend_from_slice(r.read_bytes(count)?);
        }

        let res = self.channel.transact(&requests::file_close(file_id)).await?;
        fs_status(&res, 1, "file close")?;
        Ok(data)
    }

    /// Download a file and write it to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PfxError::Io`] if the file cannot be written, plus
    /// everything [`get_file`](Self::get_file) returns.
    pub async fn get_file_to_path(&mut self, spec: &FileSpec, path: &Path) -> PfxResult<usize> {
        let data = self.get_file(spec).await?;
        tokio::fs::write(path, &data).await.map_err(PfxError::Io)?;
        Ok(data.len())
    }

    /// # Errors
    ///
    /// Returns a file-system error if the file does not exist.
    pub async fn remove_file(&mut self, spec: &FileSpec) -> PfxResult<()> {
        let file_id = self.resolve_file(spec).await?;
        let res = self.channel.transact(&requests::remove_file(file_id)).await?;
        fs_status(&res, 2, "file remove")?;
        self.file_dir.files.retain(|f| f.id != file_id);
        self.publish_file_names();
        info!(file_id, "file removed");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a validation error for names over 32 bytes and a file-system
    /// error if the file does not exist.
    pub async fn rename_file(&mut self, spec: &FileSpec, new_name: &str) -> PfxResult<()> {
        let file_id = self.resolve_file(spec).await?;
        let res = self
            .channel
            .transact(&requests::rename_file(file_id, new_name)?)
            .await?;
        fs_status(&res, 2, "file rename")?;
        if let Some(entry) = self.file_dir.files.iter_mut().find(|f| f.id == file_id) {
            entry.name = new_name.to_string();
        }
        self.publish_file_names();
        debug!(file_id, name = new_name, "file renamed");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a file-system error if the file does not exist.
    pub async fn set_file_attributes(&mut self, spec: &FileSpec, attributes: u16) -> PfxResult<()> {
        let file_id = self.resolve_file(spec).await?;
        let res = self
            .channel
            .transact(&requests::set_file_attributes(file_id, attributes))
            .await?;
        fs_status(&res, 2, "set file attributes")?;
        if let Some(entry) = self.file_dir.files.iter_mut().find(|f| f.id == file_id) {
            entry.attributes = attributes;
        }
        Ok(())
    }

    /// Erase every file. A quick format only clears the directory.
    ///
    /// # Errors
    ///
    /// Returns a file-system error if the brick refuses.
    pub async fn format_fs(&mut self, quick: bool) -> PfxResult<()> {
        warn!(quick, "formatting PFx Brick file system");
        let res = self.channel.transact(&requests::format_fs(quick)).await?;
        fs_status(&res, 1, "format")?;
        self.file_dir = FileDir::default();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::FileNotFound`] for an unknown script name
    /// and a file-system error if the brick refuses.
    pub async fn run_script(&mut self, spec: &FileSpec) -> PfxResult<()> {
        let file_id = self.resolve_file(spec).await?;
        let res = self.channel.transact(&requests::run_script(file_id)).await?;
        fs_status(&res, 1, "run script")?;
        Ok(())
    }

    /// Stop any running script.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn stop_script(&mut self) -> PfxResult<()> {
        let res = self.channel.transact(&requests::stop_script()).await?;
        fs_status(&res, 1, "stop script")?;
        Ok(())
    }
}
