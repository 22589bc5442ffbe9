//! Structural checks over a workspace's shapes.
//!
//! Validation never changes anything; it reports:
//! - point lists that do not fit their shape kind, or hold NaN/infinite values
//! - points outside the image
//! - compacted masks whose runs do not cover their area, or whose size
//!   disagrees with their detection box
//! - empty labels and out-of-range confidence scores

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use crate::geometry::Point;
use crate::shape::{InstanceMask, Shape, ShapeKind};
use crate::workspace::Workspace;

/// Options for validation behavior.
#[derive(Clone, Debug)]
pub struct ValidateOptions {
    /// If true, warnings fail validation too.
    pub strict: bool,

    /// How far, in pixels, a point may lie outside the image before it is
    /// reported.
    pub bounds_tolerance: f64,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            strict: false,
            bounds_tolerance: 0.5,
        }
    }
}

/// Validates every shape in `workspace` against its image size.
pub fn validate_workspace(workspace: &Workspace, opts: &ValidateOptions) -> ValidationReport {
    validate_shapes(
        workspace.shapes(),
        workspace.image_width(),
        workspace.image_height(),
        opts,
    )
}

/// Validates shapes annotated on an image of the given size. Issues refer
/// to shapes by their position in `shapes`.
pub fn validate_shapes<'a, I>(
    shapes: I,
    image_width: u32,
    image_height: u32,
    opts: &ValidateOptions,
) -> ValidationReport
where
    I: IntoIterator<Item = &'a Shape>,
{
    let mut report = ValidationReport::new();
    for (index, shape) in shapes.into_iter().enumerate() {
        validate_shape(index, shape, image_width, image_height, opts, &mut report);
    }
    report
}

fn validate_shape(
    index: usize,
    shape: &Shape,
    image_width: u32,
    image_height: u32,
    opts: &ValidateOptions,
    report: &mut ValidationReport,
) {
    let context = IssueContext::Shape { index };

    if shape.label().trim().is_empty() {
        report.add(ValidationIssue::warning(
            IssueCode::EmptyLabel,
            "Empty label",
            context.clone(),
        ));
    }

    validate_point_count(shape, &context, report);
    validate_points(
        shape.points(),
        image_width,
        image_height,
        opts,
        &context,
        report,
    );

    if let ShapeKind::Mask(mask) = shape.kind() {
        validate_mask(mask, shape, &context, report);
    }

    if let Some(segment) = shape.segment() {
        if !(0.0..=1.0).contains(&segment.confidence) {
            report.add(ValidationIssue::warning(
                IssueCode::ConfidenceOutOfRange,
                format!("Confidence {} is outside [0, 1]", segment.confidence),
                context,
            ));
        }
    }
}

fn validate_point_count(shape: &Shape, context: &IssueContext, report: &mut ValidationReport) {
    let kind = shape.kind();
    let count = shape.points().len();
    let (min, max) = (kind.min_points(), kind.max_points());
    if count >= min && max.is_none_or(|max| count <= max) {
        return;
    }

    let code = match kind {
        ShapeKind::Rectangle => IssueCode::RectanglePointCount,
        ShapeKind::Polygon => IssueCode::PolygonTooFewPoints,
        ShapeKind::Mask(_) => IssueCode::MaskPointCount,
    };
    let expected = match max {
        Some(max) if max == min => format!("exactly {}", min),
        _ => format!("at least {}", min),
    };
    report.add(ValidationIssue::error(
        code,
        format!(
            "{} shape has {} point(s), expected {}",
            shape.shape_type(),
            count,
            expected
        ),
        context.clone(),
    ));
}

fn validate_points(
    points: &[Point],
    image_width: u32,
    image_height: u32,
    opts: &ValidateOptions,
    context: &IssueContext,
    report: &mut ValidationReport,
) {
    let (w, h) = (f64::from(image_width), f64::from(image_height));
    let tolerance = opts.bounds_tolerance;

    for (i, point) in points.iter().enumerate() {
        if !point.is_finite() {
            report.add(ValidationIssue::error(
                IssueCode::NonFinitePoint,
                format!("Point {} has non-finite coordinates {}", i, point),
                context.clone(),
            ));
            continue;
        }
        if point.x < -tolerance
            || point.y < -tolerance
            || point.x > w + tolerance
            || point.y > h + tolerance
        {
            report.add(ValidationIssue::warning(
                IssueCode::PointOutOfBounds,
                format!(
                    "Point {} {} lies outside the image (0, 0, {}, {})",
                    i, point, image_width, image_height
                ),
                context.clone(),
            ));
        }
    }
}

fn validate_mask(
    mask: &InstanceMask,
    shape: &Shape,
    context: &IssueContext,
    report: &mut ValidationReport,
) {
    if let InstanceMask::Rle(rle) = mask {
        if !rle.is_consistent() {
            report.add(ValidationIssue::error(
                IssueCode::RleLengthMismatch,
                format!(
                    "Mask runs cover {} pixel(s), but the mask is {}x{}",
                    rle.total_len(),
                    rle.width,
                    rle.height
                ),
                context.clone(),
            ));
        }
    }

    if let Some(segment) = shape.segment() {
        let bbox = segment.bbox;
        if mask.width() != bbox.width || mask.height() != bbox.height {
            report.add(ValidationIssue::warning(
                IssueCode::MaskSizeMismatch,
                format!(
                    "Mask is {}x{}, detection box is {}x{}",
                    mask.width(),
                    mask.height(),
                    bbox.width,
                    bbox.height
                ),
                context.clone(),
            ));
        }
    }
}
