//! Callout placement and vector markup.
//!
//! A [`Callout`] binds one [`Annotation`] to a [`CalloutDefinition`] and a
//! canvas. [`Callout::geometry`] resolves where the leader line, anchor dot,
//! bubble and numeral go at a given scale; [`Callout::render_to_svg`] emits the
//! self-contained `<g class="callout">` group stored in annotation layers.
//!
//! ```text
//!   line_start                      anchor
//!       ( 7 )──────────────────────────●
//!     bubble
//! ```

use svg::node::element as svg_element;

use crate::{
    annotation::{Annotation, Side},
    apply_stroke,
    color::Color,
    draw::{StrokeDefinition, Text, TextDefinition},
    geometry::{CanvasSize, Point},
};

/// Sizes and colors shared by every callout of a deployment.
///
/// All lengths are in canvas units.
///
/// # Default Values
///
/// | Property | Default |
/// |----------|---------|
/// | Leader offset | `50` |
/// | Bubble radius | `20` |
/// | Anchor radius | `3` |
/// | Leader | black, width `1`, solid |
/// | Anchor color | black |
/// | Bubble color | black |
/// | Numeral | bold, size `20`, white |
#[derive(Debug, Clone, PartialEq)]
pub struct CalloutDefinition {
    leader_offset: f32,
    bubble_radius: f32,
    anchor_radius: f32,
    leader: StrokeDefinition,
    anchor_color: Color,
    bubble_color: Color,
    numeral: TextDefinition,
}

impl CalloutDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distance of the vertical anchor line from the chosen canvas edge.
    pub fn leader_offset(&self) -> f32 {
        self.leader_offset
    }

    pub fn bubble_radius(&self) -> f32 {
        self.bubble_radius
    }

    pub fn anchor_radius(&self) -> f32 {
        self.anchor_radius
    }

    pub fn leader(&self) -> &StrokeDefinition {
        &self.leader
    }

    pub fn anchor_color(&self) -> Color {
        self.anchor_color
    }

    pub fn bubble_color(&self) -> Color {
        self.bubble_color
    }

    pub fn numeral(&self) -> &TextDefinition {
        &self.numeral
    }

    /// Color of the numeral, white unless configured.
    pub fn numeral_color(&self) -> Color {
        self.numeral.color().copied().unwrap_or_else(white)
    }

    pub fn set_leader_offset(&mut self, offset: f32) {
        self.leader_offset = offset;
    }

    pub fn set_bubble_radius(&mut self, radius: f32) {
        self.bubble_radius = radius;
    }

    pub fn set_anchor_radius(&mut self, radius: f32) {
        self.anchor_radius = radius;
    }

    pub fn set_leader(&mut self, leader: StrokeDefinition) {
        self.leader = leader;
    }

    /// Sets the color of the anchor dot. The dot follows the leader line by
    /// default.
    pub fn set_anchor_color(&mut self, color: Color) {
        self.anchor_color = color;
    }

    pub fn set_bubble_color(&mut self, color: Color) {
        self.bubble_color = color;
    }

    pub fn set_numeral(&mut self, numeral: TextDefinition) {
        self.numeral = numeral;
    }

    /// Returns the x coordinate of the vertical line leader lines start from.
    ///
    /// # Examples
    ///
    /// ```
    /// # use callout_core::draw::CalloutDefinition;
    /// # use callout_core::annotation::Side;
    /// # use callout_core::geometry::CanvasSize;
    /// let def = CalloutDefinition::default();
    /// assert_eq!(def.line_start_x(Side::Left, CanvasSize::DEFAULT), 50.0);
    /// assert_eq!(def.line_start_x(Side::Right, CanvasSize::DEFAULT), 650.0);
    /// ```
    pub fn line_start_x(&self, side: Side, canvas: CanvasSize) -> f32 {
        match side {
            Side::Left => self.leader_offset,
            Side::Right => canvas.width() as f32 - self.leader_offset,
        }
    }
}

impl Default for CalloutDefinition {
    fn default() -> Self {
        let mut numeral = TextDefinition::new();
        numeral.set_color(Some(white()));

        Self {
            leader_offset: 50.0,
            bubble_radius: 20.0,
            anchor_radius: 3.0,
            leader: StrokeDefinition::default(),
            anchor_color: Color::default(),
            bubble_color: Color::default(),
            numeral,
        }
    }
}

fn white() -> Color {
    Color::new("white").unwrap_or_default()
}

/// Resolved placement of one callout at a particular scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalloutGeometry {
    /// Where the leader line begins; also the bubble center.
    pub line_start: Point,
    /// The annotated point; also the anchor dot center.
    pub anchor: Point,
    pub bubble_radius: f32,
    pub anchor_radius: f32,
    pub leader_width: f32,
    pub font_size: f32,
}

impl CalloutGeometry {
    pub fn bubble_center(&self) -> Point {
        self.line_start
    }

    /// Bubble diameter rounded to whole pixels, as used for raster disks.
    pub fn bubble_diameter_px(&self) -> u32 {
        let diameter = (self.bubble_radius * 2.0).round();
        if diameter.is_finite() && diameter > 0.0 {
            diameter as u32
        } else {
            0
        }
    }
}

/// One annotation ready to be drawn.
#[derive(Debug, Clone, Copy)]
pub struct Callout<'a> {
    definition: &'a CalloutDefinition,
    annotation: &'a Annotation,
    canvas: CanvasSize,
}

impl<'a> Callout<'a> {
    pub fn new(
        definition: &'a CalloutDefinition,
        annotation: &'a Annotation,
        canvas: CanvasSize,
    ) -> Self {
        Self {
            definition,
            annotation,
            canvas,
        }
    }

    pub fn annotation(&self) -> &Annotation {
        self.annotation
    }

    /// Resolves positions and sizes multiplied by `factor`.
    ///
    /// A factor of `1.0` yields canvas coordinates; the raster compositor
    /// passes its supersampling factor.
    ///
    /// # Examples
    ///
    /// ```
    /// # use callout_core::annotation::{Annotation, Side};
    /// # use callout_core::draw::{Callout, CalloutDefinition};
    /// # use callout_core::geometry::CanvasSize;
    /// let def = CalloutDefinition::default();
    /// let ann = Annotation::new(2, 500.0, 200.0, Side::Right);
    /// let geom = Callout::new(&def, &ann, CanvasSize::DEFAULT).geometry(4.0);
    ///
    /// assert_eq!(geom.line_start.x(), 2600.0);
    /// assert_eq!(geom.anchor.y(), 800.0);
    /// assert_eq!(geom.bubble_radius, 80.0);
    /// ```
    pub fn geometry(&self, factor: f32) -> CalloutGeometry {
        let def = self.definition;
        let ann = self.annotation;
        let start_x = def.line_start_x(ann.side, self.canvas);

        CalloutGeometry {
            line_start: Point::new(start_x, ann.y).scale(factor),
            anchor: ann.anchor().scale(factor),
            bubble_radius: def.bubble_radius * factor,
            anchor_radius: def.anchor_radius * factor,
            leader_width: def.leader.width() * factor,
            font_size: def.numeral.font_size() * factor,
        }
    }

    /// Emits the callout as an SVG group.
    ///
    /// The group carries the annotation's fields as `data-*` attributes so the
    /// annotation can be recovered without interpreting the drawing. Children
    /// are painted in order: leader line, anchor dot, bubble, numeral.
    pub fn render_to_svg(&self) -> svg_element::Group {
        let def = self.definition;
        let ann = self.annotation;
        let geom = self.geometry(1.0);

        let line = svg_element::Line::new()
            .set("x1", geom.line_start.x())
            .set("y1", geom.line_start.y())
            .set("x2", geom.anchor.x())
            .set("y2", geom.anchor.y());
        let line = apply_stroke!(line, def.leader());

        let anchor = svg_element::Circle::new()
            .set("class", "anchor")
            .set("cx", geom.anchor.x())
            .set("cy", geom.anchor.y())
            .set("r", geom.anchor_radius)
            .set("fill", def.anchor_color().to_string());

        let bubble = svg_element::Circle::new()
            .set("class", "bubble")
            .set("cx", geom.line_start.x())
            .set("cy", geom.line_start.y())
            .set("r", geom.bubble_radius)
            .set("fill", def.bubble_color().to_string());

        let label = ann.id.to_string();
        let numeral = Text::new(def.numeral(), &label).render_to_svg(geom.bubble_center());

        svg_element::Group::new()
            .set("class", "callout")
            .set("data-id", ann.id)
            .set("data-x", ann.x)
            .set("data-y", ann.y)
            .set("data-side", ann.side.as_str())
            .add(line)
            .add(anchor)
            .add(bubble)
            .add(numeral)
    }
}
