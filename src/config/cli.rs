use crate::core::Storage;
use crate::utils::error::Result;
use std::path::Path;
use tokio::fs;

/// Files under one directory. Writes go to a temp file first and are renamed
/// into place, so a reader never observes a half-written snapshot.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full_path = Path::new(&self.base_path).join(path);
        match fs::read(&full_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // 先寫暫存檔再 rename，同一目錄下 rename 是原子操作
        let tmp_path = full_path.with_extension("tmp");
        fs::write(&tmp_path, data).await?;
        fs::rename(&tmp_path, &full_path).await?;
        Ok(())
    }
}
