use std::path::{Path, PathBuf};

/// The three files that belong to one annotated image.
///
/// For `dir/cells.jpg` these are `dir/cells.json` (annotations) and
/// `dir/cells_mask.png` (the whole-image binary mask).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspacePaths {
    pub image: PathBuf,
    pub annotation: PathBuf,
    pub mask: PathBuf,
}

impl WorkspacePaths {
    /// Derives the annotation and mask paths from the image path.
    pub fn from_image_path(image: &Path) -> Self {
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = image.parent().unwrap_or_else(|| Path::new(""));
        Self {
            image: image.to_path_buf(),
            annotation: parent.join(format!("{}.json", stem)),
            mask: parent.join(format!("{}_mask.png", stem)),
        }
    }
}
