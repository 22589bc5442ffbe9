//! The per-image annotation store.
//!
//! A [`Workspace`] owns one image, every shape annotated on it and the
//! optional whole-image binary mask, and mediates all reads and writes of
//! their on-disk forms (see [`WorkspacePaths`]).
//!
//! Shapes are addressed two ways. Positional indices follow insertion order
//! and shift down when an earlier shape is removed. A [`ShapeId`] is assigned
//! at insertion and stays valid until that shape is removed, so callers that
//! hold on to a shape across edits should keep its id, not its index.

mod ids;
pub mod io_json;
pub mod mask_file;
mod paths;

pub use ids::ShapeId;
pub use io_json::{AnnotationFile, ShapeRecord};
pub use mask_file::MASK_FILE_THRESHOLD;
pub use paths::WorkspacePaths;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::carrier::ImageCarrier;
use crate::error::AnnotoolError;
use crate::geometry::{Point, ShapeType};
use crate::inference::ModelProcessor;
use crate::mask::BinaryMask;
use crate::shape::{Shape, ShapeKind};

/// Where a workspace is in its edit cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkspaceState {
    /// Populated from disk (or freshly created) and not edited since.
    Loaded,
    /// Edited since the last load or save.
    Mutated,
    /// Saved, with no edits since.
    Persisted,
}

/// The annotation store for one image.
#[derive(Debug)]
pub struct Workspace {
    image: ImageCarrier,
    paths: WorkspacePaths,
    order: Vec<ShapeId>,
    shapes: HashMap<ShapeId, Shape>,
    next_id: u64,
    binary_mask: Option<BinaryMask>,
    state: WorkspaceState,
}

impl Workspace {
    /// Opens the image at `image_path` and loads its annotation and mask
    /// files when they exist.
    ///
    /// # Errors
    /// Fails if the image cannot be decoded or a companion file exists but
    /// cannot be read. Companion files that are empty or malformed are
    /// skipped.
    pub fn open(image_path: &Path) -> Result<Self, AnnotoolError> {
        let image = ImageCarrier::open(image_path)?;
        let mut workspace = Self::from_image(image);
        workspace.load_from_annotation_file()?;
        workspace.load_from_mask_file()?;
        log::info!(
            "Opened {} ({}x{}) with {} shape(s)",
            image_path.display(),
            workspace.image_width(),
            workspace.image_height(),
            workspace.len()
        );
        Ok(workspace)
    }

    /// Wraps an already-loaded image without touching the disk.
    pub fn from_image(image: ImageCarrier) -> Self {
        let paths = WorkspacePaths::from_image_path(image.path());
        Self {
            image,
            paths,
            order: Vec::new(),
            shapes: HashMap::new(),
            next_id: 0,
            binary_mask: None,
            state: WorkspaceState::Loaded,
        }
    }

    /// Number of shapes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Shapes in index order.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> + '_ {
        self.order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Shapes in index order, paired with their ids.
    pub fn shapes_with_ids(&self) -> impl Iterator<Item = (ShapeId, &Shape)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.shapes.get(id).map(|shape| (*id, shape)))
    }

    /// The shape at `index`.
    pub fn shape(&self, index: usize) -> Option<&Shape> {
        self.id_at(index).and_then(|id| self.shapes.get(&id))
    }

    pub fn shape_by_id(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    /// The id of the shape currently at `index`.
    pub fn id_at(&self, index: usize) -> Option<ShapeId> {
        self.order.get(index).copied()
    }

    /// The current index of the shape with `id`.
    pub fn index_of(&self, id: ShapeId) -> Option<usize> {
        self.order.iter().position(|&candidate| candidate == id)
    }

    /// Creates a shape and appends it.
    ///
    /// The points go through the shape's history-tracked setter, so one undo
    /// step returns the new shape to an empty point list.
    pub fn add_shape(
        &mut self,
        label: impl Into<String>,
        points: Vec<Point>,
        shape_type: ShapeType,
    ) -> ShapeId {
        let kind = ShapeKind::from_type(shape_type, &points, self.image_size());
        let mut shape = Shape::new(label, kind);
        shape.set_points(points);
        let id = self.insert(shape);
        log::debug!("Added {} shape {} at index {}", shape_type, id, self.len() - 1);
        id
    }

    /// Removes the shape at `index`; later shapes move down by one.
    ///
    /// # Errors
    /// Returns [`AnnotoolError::ShapeIndexOutOfRange`] and leaves the
    /// collection unchanged if `index` is out of range.
    pub fn remove_shape(&mut self, index: usize) -> Result<Shape, AnnotoolError> {
        let id = self.checked_id(index)?;
        let shape = self
            .shapes
            .remove(&id)
            .ok_or(AnnotoolError::ShapeIndexOutOfRange {
                index,
                len: self.order.len(),
            })?;
        self.order.remove(index);
        self.state = WorkspaceState::Mutated;
        log::debug!("Removed shape {} from index {}", id, index);
        Ok(shape)
    }

    /// Removes the shape with `id`, wherever it currently sits.
    pub fn remove_shape_by_id(&mut self, id: ShapeId) -> Option<Shape> {
        let index = self.index_of(id)?;
        self.remove_shape(index).ok()
    }

    /// Replaces the label and points of the shape at `index`. The point
    /// change is undoable; the label change is not.
    ///
    /// # Errors
    /// Returns [`AnnotoolError::ShapeIndexOutOfRange`] and leaves the
    /// collection unchanged if `index` is out of range.
    pub fn update_shape(
        &mut self,
        index: usize,
        label: impl Into<String>,
        points: Vec<Point>,
    ) -> Result<(), AnnotoolError> {
        let shape = self.shape_mut(index)?;
        shape.set_label(label);
        shape.set_points(points);
        self.state = WorkspaceState::Mutated;
        log::debug!("Updated shape at index {}", index);
        Ok(())
    }

    /// Undoes the last point edit of the shape at `index`.
    ///
    /// Returns `Ok(false)` when that shape has no history.
    pub fn undo_shape(&mut self, index: usize) -> Result<bool, AnnotoolError> {
        let undone = self.shape_mut(index)?.undo_last_change();
        if undone {
            self.state = WorkspaceState::Mutated;
        }
        Ok(undone)
    }

    /// Appends shapes after the existing ones; nothing is replaced.
    pub fn import_shapes<I>(&mut self, shapes: I) -> Vec<ShapeId>
    where
        I: IntoIterator<Item = Shape>,
    {
        let ids: Vec<ShapeId> = shapes.into_iter().map(|shape| self.insert(shape)).collect();
        log::debug!("Imported {} shape(s); now {}", ids.len(), self.len());
        ids
    }

    fn insert(&mut self, shape: Shape) -> ShapeId {
        let id = ShapeId::new(self.next_id);
        self.next_id += 1;
        self.order.push(id);
        self.shapes.insert(id, shape);
        self.state = WorkspaceState::Mutated;
        id
    }

    fn checked_id(&self, index: usize) -> Result<ShapeId, AnnotoolError> {
        self.id_at(index).ok_or(AnnotoolError::ShapeIndexOutOfRange {
            index,
            len: self.order.len(),
        })
    }

    fn shape_mut(&mut self, index: usize) -> Result<&mut Shape, AnnotoolError> {
        let id = self.checked_id(index)?;
        let len = self.order.len();
        self.shapes
            .get_mut(&id)
            .ok_or(AnnotoolError::ShapeIndexOutOfRange { index, len })
    }

    /// Replaces the whole collection; ids of the old shapes become invalid.
    fn replace_all(&mut self, shapes: Vec<Shape>) {
        self.order.clear();
        self.shapes.clear();
        for shape in shapes {
            self.insert(shape);
        }
    }

    /// Replaces the collection with the contents of the annotation file.
    ///
    /// Returns `Ok(false)`, leaving the collection untouched, if the file is
    /// missing, empty, not a valid annotation record, or has no `shapes`
    /// field. The collection is only replaced once the whole file has been
    /// decoded.
    ///
    /// # Errors
    /// Fails only if the file exists but cannot be read.
    pub fn load_from_annotation_file(&mut self) -> Result<bool, AnnotoolError> {
        let path = self.paths.annotation.clone();
        if !path.exists() {
            log::debug!("No annotation file at {}", path.display());
            return Ok(false);
        }
        if fs::metadata(&path).map_err(AnnotoolError::Io)?.len() == 0 {
            log::warn!("Annotation file {} is empty; skipping", path.display());
            return Ok(false);
        }

        let record = match io_json::read_annotation_file(&path) {
            Ok(record) => record,
            Err(AnnotoolError::AnnotationParse { source, .. }) => {
                log::warn!(
                    "Annotation file {} is not a valid annotation record ({}); skipping",
                    path.display(),
                    source
                );
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        let Some(records) = record.shapes else {
            log::warn!(
                "Annotation file {} has no 'shapes' field; skipping",
                path.display()
            );
            return Ok(false);
        };

        let bounds = self.image_size();
        let shapes: Vec<Shape> = records
            .into_iter()
            .map(|record| record.into_shape(bounds))
            .collect();
        self.replace_all(shapes);
        self.state = WorkspaceState::Loaded;
        log::info!("Loaded {} shape(s) from {}", self.len(), path.display());
        Ok(true)
    }

    /// Writes the image path and every shape to the annotation file,
    /// overwriting it and creating parent directories as needed.
    pub fn save_to_annotation_file(&mut self) -> Result<(), AnnotoolError> {
        let record = self.to_annotation_record();
        io_json::write_annotation_file(&self.paths.annotation, &record)?;
        self.state = WorkspaceState::Persisted;
        log::info!(
            "Saved {} shape(s) to {}",
            self.len(),
            self.paths.annotation.display()
        );
        Ok(())
    }

    /// Writes the annotation file only if none exists yet.
    ///
    /// Returns `Ok(true)` if a file was created.
    pub fn create_annotation_file(&mut self) -> Result<bool, AnnotoolError> {
        if self.paths.annotation.exists() {
            return Ok(false);
        }
        self.save_to_annotation_file()?;
        Ok(true)
    }

    /// The on-disk record for the current collection.
    pub fn to_annotation_record(&self) -> AnnotationFile {
        AnnotationFile {
            image_path: self.paths.image.to_string_lossy().into_owned(),
            shapes: Some(self.shapes().map(ShapeRecord::from_shape).collect()),
        }
    }

    /// Replaces the whole-image mask with the contents of the mask file.
    ///
    /// Returns `Ok(false)`, leaving the current mask untouched, if the file
    /// is missing, cannot be decoded, or does not match the image size.
    ///
    /// # Errors
    /// Fails only if the file exists but cannot be read.
    pub fn load_from_mask_file(&mut self) -> Result<bool, AnnotoolError> {
        let path = self.paths.mask.clone();
        if !path.exists() {
            log::debug!("No mask file at {}", path.display());
            return Ok(false);
        }

        let mask = match mask_file::read_mask_png(&path) {
            Ok(mask) => mask,
            Err(AnnotoolError::Image {
                source: image::ImageError::IoError(e),
                ..
            }) => return Err(AnnotoolError::Io(e)),
            Err(AnnotoolError::Image { source, .. }) => {
                log::warn!(
                    "Mask file {} could not be decoded ({}); skipping",
                    path.display(),
                    source
                );
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        if let Err(e) = self.check_mask_size(&mask) {
            log::warn!("Mask file {}: {}; skipping", path.display(), e);
            return Ok(false);
        }

        log::info!(
            "Loaded mask {} ({} foreground pixel(s))",
            path.display(),
            mask.foreground_count()
        );
        self.binary_mask = Some(mask);
        Ok(true)
    }

    /// Writes the whole-image mask to the mask file.
    ///
    /// Returns `Ok(false)` without writing if the workspace has no mask.
    pub fn save_binary_mask_as_png(&self) -> Result<bool, AnnotoolError> {
        let Some(mask) = &self.binary_mask else {
            log::debug!("No whole-image mask to save");
            return Ok(false);
        };
        mask_file::write_mask_png(&self.paths.mask, mask)?;
        log::info!("Saved mask to {}", self.paths.mask.display());
        Ok(true)
    }

    pub fn binary_mask(&self) -> Option<&BinaryMask> {
        self.binary_mask.as_ref()
    }

    /// Replaces the whole-image mask.
    ///
    /// # Errors
    /// Returns [`AnnotoolError::MaskDimensions`] if `mask` is not the size of
    /// the image.
    pub fn set_binary_mask(&mut self, mask: BinaryMask) -> Result<(), AnnotoolError> {
        self.check_mask_size(&mask)?;
        self.binary_mask = Some(mask);
        self.state = WorkspaceState::Mutated;
        Ok(())
    }

    fn check_mask_size(&self, mask: &BinaryMask) -> Result<(), AnnotoolError> {
        if mask.width() != self.image_width() || mask.height() != self.image_height() {
            return Err(AnnotoolError::MaskDimensions {
                expected_width: self.image_width(),
                expected_height: self.image_height(),
                actual_width: mask.width(),
                actual_height: mask.height(),
            });
        }
        Ok(())
    }

    /// Runs `processor` on the image, appends the shapes it finds after the
    /// existing ones and replaces the whole-image mask with its output.
    ///
    /// Returns the number of shapes added. On error nothing is changed.
    pub fn run_model_processor<P>(&mut self, processor: &mut P) -> Result<usize, AnnotoolError>
    where
        P: ModelProcessor + ?Sized,
    {
        let output = processor.infer(&self.image.to_rgb8())?;
        self.check_mask_size(&output.binary_mask)?;

        let added = output.shapes.len();
        self.import_shapes(output.shapes);
        self.binary_mask = Some(output.binary_mask);
        self.state = WorkspaceState::Mutated;
        log::info!(
            "Model produced {} shape(s); workspace now holds {}",
            added,
            self.len()
        );
        Ok(added)
    }

    pub fn image(&self) -> &ImageCarrier {
        &self.image
    }

    fn image_size(&self) -> (u32, u32) {
        (self.image_width(), self.image_height())
    }

    pub fn image_width(&self) -> u32 {
        self.image.width()
    }

    pub fn image_height(&self) -> u32 {
        self.image.height()
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    pub fn state(&self) -> WorkspaceState {
        self.state
    }

    /// Returns true if there are edits not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.state == WorkspaceState::Mutated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn workspace_in(dir: &Path) -> Workspace {
        let image = ImageCarrier::from_image(dir.join("cells.png"), DynamicImage::new_rgb8(100, 100));
        Workspace::from_image(image)
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point> {
        vec![Point::new(x0, y0), Point::new(x1, y1)]
    }

    #[test]
    fn test_remove_shifts_later_indices() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut ws = workspace_in(temp.path());
        let a = ws.add_shape("a", rect(0.0, 0.0, 1.0, 1.0), ShapeType::Rectangle);
        let b = ws.add_shape("b", rect(0.0, 0.0, 2.0, 2.0), ShapeType::Rectangle);
        let c = ws.add_shape("c", rect(0.0, 0.0, 3.0, 3.0), ShapeType::Rectangle);

        let removed = ws.remove_shape(1).unwrap();
        assert_eq!(removed.label(), "b");
        assert_eq!(ws.len(), 2);
        assert_eq!(ws.shape(1).unwrap().label(), "c");
        assert_eq!(ws.index_of(c), Some(1));
        assert_eq!(ws.index_of(a), Some(0));
        assert_eq!(ws.index_of(b), None);
    }

    #[test]
    fn test_out_of_range_leaves_collection_unchanged() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut ws = workspace_in(temp.path());
        ws.add_shape("a", rect(0.0, 0.0, 1.0, 1.0), ShapeType::Rectangle);

        let err = ws.remove_shape(1).unwrap_err();
        assert!(matches!(
            err,
            AnnotoolError::ShapeIndexOutOfRange { index: 1, len: 1 }
        ));
        assert!(ws.update_shape(5, "x", Vec::new()).is_err());
        assert!(ws.undo_shape(5).is_err());
        assert_eq!(ws.len(), 1);
        assert_eq!(ws.shape(0).unwrap().label(), "a");
    }

    #[test]
    fn test_update_is_undoable_for_points_only() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut ws = workspace_in(temp.path());
        ws.add_shape("a", rect(0.0, 0.0, 1.0, 1.0), ShapeType::Rectangle);
        ws.update_shape(0, "b", rect(5.0, 5.0, 6.0, 6.0)).unwrap();

        assert!(ws.undo_shape(0).unwrap());
        let shape = ws.shape(0).unwrap();
        assert_eq!(shape.label(), "b");
        assert_eq!(shape.points(), rect(0.0, 0.0, 1.0, 1.0).as_slice());
    }

    #[test]
    fn test_ids_survive_removal_of_earlier_shapes() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut ws = workspace_in(temp.path());
        let first = ws.add_shape("a", rect(0.0, 0.0, 1.0, 1.0), ShapeType::Rectangle);
        let second = ws.add_shape("b", rect(0.0, 0.0, 1.0, 1.0), ShapeType::Rectangle);

        assert_eq!(ws.remove_shape_by_id(first).unwrap().label(), "a");
        assert_eq!(ws.shape_by_id(second).unwrap().label(), "b");
        assert_eq!(ws.id_at(0), Some(second));
        assert!(ws.remove_shape_by_id(first).is_none());
    }

    #[test]
    fn test_state_transitions() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut ws = workspace_in(temp.path());
        assert_eq!(ws.state(), WorkspaceState::Loaded);
        ws.add_shape("a", rect(0.0, 0.0, 1.0, 1.0), ShapeType::Rectangle);
        assert!(ws.is_dirty());
        ws.save_to_annotation_file().unwrap();
        assert_eq!(ws.state(), WorkspaceState::Persisted);
        ws.remove_shape(0).unwrap();
        assert_eq!(ws.state(), WorkspaceState::Mutated);
    }

    #[test]
    fn test_malformed_annotation_file_is_skipped() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut ws = workspace_in(temp.path());
        ws.add_shape("keep", rect(0.0, 0.0, 1.0, 1.0), ShapeType::Rectangle);

        fs::write(&ws.paths().annotation, "").unwrap();
        assert!(!ws.load_from_annotation_file().unwrap());
        fs::write(&ws.paths().annotation, "{ not json").unwrap();
        assert!(!ws.load_from_annotation_file().unwrap());
        fs::write(&ws.paths().annotation, r#"{"image_path": "cells.png"}"#).unwrap();
        assert!(!ws.load_from_annotation_file().unwrap());

        assert_eq!(ws.len(), 1);
        assert_eq!(ws.shape(0).unwrap().label(), "keep");
    }

    #[test]
    fn test_create_annotation_file_only_once() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut ws = workspace_in(temp.path());
        assert!(ws.create_annotation_file().unwrap());
        ws.add_shape("a", rect(0.0, 0.0, 1.0, 1.0), ShapeType::Rectangle);
        assert!(!ws.create_annotation_file().unwrap());

        let record = io_json::read_annotation_file(&ws.paths().annotation).unwrap();
        assert_eq!(record.shapes.unwrap().len(), 0);
    }

    #[test]
    fn test_binary_mask_roundtrip_and_size_check() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut ws = workspace_in(temp.path());
        assert!(!ws.save_binary_mask_as_png().unwrap());

        let err = ws.set_binary_mask(BinaryMask::new(10, 10)).unwrap_err();
        assert!(matches!(err, AnnotoolError::MaskDimensions { .. }));

        let mut mask = BinaryMask::new(100, 100);
        mask.set(42, 7, true);
        ws.set_binary_mask(mask.clone()).unwrap();
        assert!(ws.save_binary_mask_as_png().unwrap());

        let mut fresh = workspace_in(temp.path());
        assert!(fresh.load_from_mask_file().unwrap());
        assert_eq!(fresh.binary_mask(), Some(&mask));
    }
}
