//! 上传图片的文件存储

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::app::product::form::UploadedImage;

/// 图片落盘目录
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

/// `<毫秒时间戳>_<原始文件名>`
///
/// 原始文件名只保留最后一段路径，为空时使用 `upload`。
pub fn image_filename(timestamp_ms: i64, original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("upload");
    format!("{}_{}", timestamp_ms, base)
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 确保目录存在
    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// 写入图片并返回生成的文件名
    pub async fn save(&self, image: &UploadedImage) -> io::Result<String> {
        self.ensure_dir().await?;

        let filename = image_filename(chrono::Utc::now().timestamp_millis(), &image.file_name);
        let path = self.dir.join(&filename);
        fs::write(&path, &image.bytes).await?;

        debug!("stored image {} ({} bytes)", path.display(), image.bytes.len());
        Ok(filename)
    }
}
