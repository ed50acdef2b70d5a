//! Form filling pipeline
//!
//! Resolves a coordinate map for the form image, plans a position for every
//! answered field and renders the answers onto the image.
//!
//! Coordinate sources are tried in order, first success wins:
//!
//! 1. An override entry for the image (content hash, file name, file stem)
//!    carrying a non-empty coordinate map
//! 2. A persisted coordinate file
//! 3. Fresh layout analysis run through a [`FieldLocator`]
//! 4. An empty map, so every field uses the fallback table

use crate::canvas::FormCanvas;
use crate::config::OverlayConfig;
use crate::error::Result;
use crate::renderer::{
    default_output_path, Anchor, OverlayItem, OverlayRenderer, PlacementOrigin, PositionedField,
    RenderedForm,
};
use formfill_core::{
    fallback_pixel_position, AdjustmentRules, CoordinateMap, Field, FieldLocator, FieldMatcher,
    FormSchema, ImageDimensions, KeywordLocator, LayoutAnalyzer, LookupKey, OverrideEntry,
    OverrideStore,
};
use std::path::{Path, PathBuf};

// ============================================================================
// Coordinate resolution
// ============================================================================

/// Where the coordinate map for a fill came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateSource {
    /// Override entry found by the given key
    Override(LookupKey),
    /// Persisted coordinate file
    File(PathBuf),
    /// Fresh layout analysis
    Fresh,
    /// Nothing available
    Empty,
}

impl std::fmt::Display for CoordinateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Override(key) => write!(f, "override data (by {key})"),
            Self::File(path) => write!(f, "coordinate file {}", path.display()),
            Self::Fresh => write!(f, "fresh layout analysis"),
            Self::Empty => write!(f, "no coordinates"),
        }
    }
}

/// Inputs consulted when resolving coordinates
#[derive(Default)]
pub struct CoordinateSources<'a> {
    /// Loaded override entries
    pub overrides: Option<&'a OverrideStore>,
    /// Persisted coordinate map; fresh results are written here when
    /// `persist_fresh` is set
    pub coordinate_file: Option<&'a Path>,
    /// Layout analysis service
    pub analyzer: Option<&'a dyn LayoutAnalyzer>,
    /// Locator for fresh analysis; [`KeywordLocator`] when unset
    pub locator: Option<&'a dyn FieldLocator>,
    /// Write freshly located coordinates to `coordinate_file`
    pub persist_fresh: bool,
}

/// A resolved coordinate map
#[derive(Debug, Clone)]
pub struct ResolvedCoordinates<'a> {
    /// Label → normalized position
    pub coordinates: CoordinateMap,
    /// Where they came from
    pub source: CoordinateSource,
    /// Override entry for the image, even when its coordinates were unusable
    pub entry: Option<&'a OverrideEntry>,
}

// ============================================================================
// Report
// ============================================================================

/// Outcome of filling one form
#[derive(Debug, Clone)]
pub struct FillReport {
    /// Written image
    pub output: PathBuf,
    /// Coordinate source used
    pub source: CoordinateSource,
    /// Answers drawn, in schema order
    pub placed: Vec<PositionedField>,
    /// Fields skipped for having no answer
    pub skipped: usize,
}

impl FillReport {
    /// Answers placed at a matched label
    #[must_use = "count is computed but not used"]
    pub fn matched_count(&self) -> usize {
        self.placed.iter().filter(|f| !f.origin.is_fallback()).count()
    }

    /// Answers placed by the fallback table
    #[must_use = "count is computed but not used"]
    pub fn fallback_count(&self) -> usize {
        self.placed.iter().filter(|f| f.origin.is_fallback()).count()
    }
}

// ============================================================================
// Filler
// ============================================================================

/// Plans and draws answers onto form images
#[derive(Debug)]
pub struct FormFiller {
    matcher: FieldMatcher,
    adjustments: AdjustmentRules,
    renderer: OverlayRenderer,
    jpeg_quality: u8,
    output_prefix: String,
}

impl FormFiller {
    /// Build a filler from configuration, loading the font
    #[must_use = "form filler is created but not used"]
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            matcher: FieldMatcher::new(),
            adjustments: config.adjustments.clone(),
            renderer: OverlayRenderer::new(config.load_font(), config.render_options()),
            jpeg_quality: config.jpeg_quality,
            output_prefix: config.output_prefix.clone(),
        }
    }

    /// Replace the renderer
    #[must_use = "returns the updated filler"]
    pub fn with_renderer(mut self, renderer: OverlayRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the matcher
    #[must_use = "returns the updated filler"]
    pub fn with_matcher(mut self, matcher: FieldMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Field matcher in use
    #[inline]
    #[must_use = "matcher is returned but not used"]
    pub const fn matcher(&self) -> &FieldMatcher {
        &self.matcher
    }

    /// Position one answered field.
    ///
    /// Matched fields get their adjusted normalized point; unmatched fields
    /// get a fallback position in pixels.
    #[must_use = "overlay item is computed but not used"]
    pub fn plan_field(
        &self,
        field: &Field,
        value: &str,
        coordinates: &CoordinateMap,
        dims: ImageDimensions,
    ) -> OverlayItem {
        let label = field.display_label();
        let (anchor, origin) = match self.matcher.find_match(field, coordinates) {
            Some(hit) => {
                let point = self.adjustments.apply(label, hit.point);
                log::info!(
                    "Matched '{label}' to '{}' ({}) at {point}",
                    hit.candidate,
                    hit.tier
                );
                (
                    Anchor::Normalized(point),
                    PlacementOrigin::Matched {
                        candidate: hit.candidate.to_string(),
                        tier: hit.tier,
                    },
                )
            }
            None => {
                let px = fallback_pixel_position(label, dims);
                log::warn!("No coordinates for '{label}', using fallback position {px}");
                (Anchor::Pixel(px), PlacementOrigin::Fallback)
            }
        };

        OverlayItem {
            label: label.to_string(),
            value: value.to_string(),
            anchor,
            origin,
        }
    }

    /// Position every answered field of the schema.
    ///
    /// Depends only on its inputs; fields without an answer are left out.
    #[must_use = "overlay plan is computed but not used"]
    pub fn plan(
        &self,
        schema: &FormSchema,
        coordinates: &CoordinateMap,
        dims: ImageDimensions,
    ) -> Vec<OverlayItem> {
        schema
            .flatten_fields()
            .filter_map(|field| {
                let value = field.filled_value()?;
                Some(self.plan_field(field, value, coordinates, dims))
            })
            .collect()
    }

    /// Plan and draw the schema's answers on a canvas
    #[must_use = "rendered form is returned but not used"]
    pub fn render(
        &self,
        canvas: FormCanvas,
        schema: &FormSchema,
        coordinates: &CoordinateMap,
    ) -> RenderedForm {
        let items = self.plan(schema, coordinates, canvas.dimensions());
        self.renderer.render(canvas, &items)
    }

    /// Find the coordinate map for an image.
    ///
    /// # Errors
    ///
    /// Returns an error if fresh layout analysis fails. An unreadable or
    /// empty coordinate file or a failure to persist fresh results is only
    /// logged. Fresh analysis that finds no labels is never persisted.
    pub fn resolve_coordinates<'a>(
        &self,
        image: &Path,
        sources: &CoordinateSources<'a>,
    ) -> Result<ResolvedCoordinates<'a>> {
        let found = sources.overrides.and_then(|store| store.find(image));
        let entry = found.map(|(entry, _)| entry);

        if let Some((found_entry, key)) = found {
            if let Some(coordinates) = found_entry.usable_coordinates() {
                log::info!(
                    "Using {} override coordinates for {}",
                    coordinates.len(),
                    image.display()
                );
                return Ok(ResolvedCoordinates {
                    coordinates: coordinates.clone(),
                    source: CoordinateSource::Override(key),
                    entry,
                });
            }
            log::debug!("Override entry for {} has no coordinates", image.display());
        }

        if let Some(path) = sources.coordinate_file {
            if path.is_file() {
                match CoordinateMap::load(path) {
                    Ok(coordinates) => {
                        return Ok(ResolvedCoordinates {
                            coordinates,
                            source: CoordinateSource::File(path.to_path_buf()),
                            entry,
                        });
                    }
                    Err(e) => log::warn!("Ignoring coordinate file {}: {e}", path.display()),
                }
            } else {
                log::debug!("No coordinate file at {}", path.display());
            }
        }

        if let Some(analyzer) = sources.analyzer {
            let analysis = analyzer.analyze(image)?;
            let locator = sources.locator.unwrap_or(&KeywordLocator);
            let coordinates = locator.locate(&analysis);
            if coordinates.is_empty() {
                log::warn!("Layout analysis found no field labels in {}", image.display());
            } else if sources.persist_fresh {
                if let Some(path) = sources.coordinate_file {
                    if let Err(e) = coordinates.save(path) {
                        log::warn!("Could not save coordinates to {}: {e}", path.display());
                    }
                }
            }
            return Ok(ResolvedCoordinates {
                coordinates,
                source: CoordinateSource::Fresh,
                entry,
            });
        }

        log::warn!(
            "No coordinates available for {}, every field will use fallback positions",
            image.display()
        );
        Ok(ResolvedCoordinates {
            coordinates: CoordinateMap::new(),
            source: CoordinateSource::Empty,
            entry,
        })
    }

    /// Fill the form image with the schema's answers and write a JPEG.
    ///
    /// The output defaults to `<prefix><stem>.jpg` beside the input.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be opened, layout analysis fails,
    /// or the output cannot be written.
    pub fn fill(
        &self,
        image: &Path,
        schema: &FormSchema,
        sources: &CoordinateSources<'_>,
        output: Option<&Path>,
    ) -> Result<FillReport> {
        let canvas = FormCanvas::open(image)?;
        let resolved = self.resolve_coordinates(image, sources)?;
        log::info!(
            "Filling {} from {}",
            image.display(),
            resolved.source
        );

        let preset;
        let schema = match resolved.entry {
            Some(entry) if !entry.hardcoded_values.is_empty() => {
                preset = with_presets(schema, entry);
                &preset
            }
            _ => schema,
        };

        let skipped = schema
            .flatten_fields()
            .filter(|f| f.filled_value().is_none())
            .count();
        let rendered = self.render(canvas, schema, &resolved.coordinates);

        let output = output.map_or_else(
            || default_output_path(image, &self.output_prefix),
            Path::to_path_buf,
        );
        rendered.save(&output, self.jpeg_quality)?;

        Ok(FillReport {
            output,
            source: resolved.source,
            placed: rendered.into_placed(),
            skipped,
        })
    }
}

/// Copy of `schema` with override presets filled into unanswered fields
fn with_presets(schema: &FormSchema, entry: &OverrideEntry) -> FormSchema {
    let mut schema = schema.clone();
    let fields = schema
        .fields
        .iter_mut()
        .chain(schema.sections.iter_mut().flat_map(|s| s.fields.iter_mut()));
    for field in fields {
        if field.filled_value().is_none() {
            if let Some(value) = entry.hardcoded_value(field) {
                log::debug!("Using preset value for '{}'", field.display_label());
                field.value = Some(value.to_string());
            }
        }
    }
    schema
}
