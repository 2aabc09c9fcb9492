//! In-memory retained canvas shared by backends and headless playback.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::{BoardGeometry, Canvas, Color, Layer, ObjectHandle, Shape, Style};

/// Object stored by a [`RetainedCanvas`].
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasObject {
    /// Cell-sized shape.
    Shape {
        /// Top-left corner in cell units.
        position: Vec2,
        /// Outline of the shape.
        shape: Shape,
        /// Paint order hint.
        layer: Layer,
        /// Paint parameters.
        style: Style,
    },
    /// Text centred in a cell.
    Text {
        /// Top-left corner of the cell in cell units.
        position: Vec2,
        /// Text content.
        text: String,
        /// Text color.
        color: Color,
    },
    /// Line between two cell corners.
    Line {
        /// Start in cell units.
        src: Vec2,
        /// End in cell units.
        dst: Vec2,
        /// Pixel offset applied to both ends.
        offset: Vec2,
        /// Paint order hint.
        layer: Layer,
        /// Paint parameters.
        style: Style,
    },
}

impl CanvasObject {
    /// Layer the object is painted on.
    #[must_use]
    pub fn layer(&self) -> Layer {
        match self {
            Self::Shape { layer, .. } | Self::Line { layer, .. } => *layer,
            Self::Text { .. } => Layer::TEXT,
        }
    }
}

/// Canvas keeping every object in memory until it is removed.
///
/// Backends paint [`RetainedCanvas::paint_order`] each frame; tests inspect
/// the live object set and the removal counter directly.
#[derive(Clone, Debug)]
pub struct RetainedCanvas {
    objects: BTreeMap<ObjectHandle, CanvasObject>,
    paint_order: Vec<ObjectHandle>,
    next_handle: u64,
    removed: u64,
    geometry: BoardGeometry,
}

impl RetainedCanvas {
    /// Creates an empty canvas using the provided layout.
    #[must_use]
    pub fn new(geometry: BoardGeometry) -> Self {
        Self {
            objects: BTreeMap::new(),
            paint_order: Vec::new(),
            next_handle: 1,
            removed: 0,
            geometry,
        }
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Reports whether the canvas holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Reports whether `handle` refers to a live object.
    #[must_use]
    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.objects.contains_key(&handle)
    }

    /// Retrieves a live object.
    #[must_use]
    pub fn object(&self, handle: ObjectHandle) -> Option<&CanvasObject> {
        self.objects.get(&handle)
    }

    /// Number of live objects on `layer`.
    #[must_use]
    pub fn count_on_layer(&self, layer: Layer) -> usize {
        self.objects
            .values()
            .filter(|object| object.layer() == layer)
            .count()
    }

    /// Number of objects removed individually since the canvas was created.
    #[must_use]
    pub fn removed_count(&self) -> u64 {
        self.removed
    }

    /// Live objects in the order they should be painted, bottom first.
    pub fn paint_order(&self) -> impl Iterator<Item = (ObjectHandle, &CanvasObject)> {
        self.paint_order
            .iter()
            .filter_map(|handle| self.objects.get(handle).map(|object| (*handle, object)))
    }

    fn insert(&mut self, object: CanvasObject) -> ObjectHandle {
        let handle = ObjectHandle::new(self.next_handle);
        self.next_handle += 1;
        let _ = self.objects.insert(handle, object);
        self.paint_order.push(handle);
        handle
    }
}

impl Canvas for RetainedCanvas {
    fn draw_grid_object(
        &mut self,
        position: Vec2,
        shape: Shape,
        layer: Layer,
        style: Style,
    ) -> ObjectHandle {
        self.insert(CanvasObject::Shape {
            position,
            shape,
            layer,
            style,
        })
    }

    fn draw_text(&mut self, position: Vec2, text: &str, color: Color) -> ObjectHandle {
        self.insert(CanvasObject::Text {
            position,
            text: text.to_owned(),
            color,
        })
    }

    fn draw_line(
        &mut self,
        src: Vec2,
        dst: Vec2,
        offset: Vec2,
        layer: Layer,
        style: Style,
    ) -> ObjectHandle {
        self.insert(CanvasObject::Line {
            src,
            dst,
            offset,
            layer,
            style,
        })
    }

    fn remove_object(&mut self, handle: ObjectHandle) {
        if self.objects.remove(&handle).is_some() {
            self.removed += 1;
        } else {
            log::trace!("ignoring removal of unknown canvas object {}", handle.get());
        }
    }

    fn clear(&mut self) {
        self.objects.clear();
        self.paint_order.clear();
    }

    fn raise_layers(&mut self) {
        let objects = &self.objects;
        self.paint_order.retain(|handle| objects.contains_key(handle));
        self.paint_order
            .sort_by_key(|handle| (objects.get(handle).map(CanvasObject::layer), *handle));
    }

    fn configure(&mut self, geometry: BoardGeometry) {
        self.geometry = geometry;
    }

    fn geometry(&self) -> BoardGeometry {
        self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> RetainedCanvas {
        RetainedCanvas::new(BoardGeometry::new(5, 10.0, 0.0, 1.0).expect("valid geometry"))
    }

    fn fill() -> Style {
        Style::filled(Color::from_rgb_u8(10, 10, 10))
    }

    #[test]
    fn new_objects_stay_on_top_until_layers_are_raised() {
        let mut canvas = canvas();
        let text = canvas.draw_text(Vec2::ZERO, "7", Color::from_rgb_u8(0, 0, 0));
        let cell = canvas.draw_grid_object(Vec2::ZERO, Shape::Square, Layer::BACKGROUND, fill());

        let before: Vec<_> = canvas.paint_order().map(|(handle, _)| handle).collect();
        assert_eq!(before, vec![text, cell]);

        canvas.raise_layers();
        let after: Vec<_> = canvas.paint_order().map(|(handle, _)| handle).collect();
        assert_eq!(after, vec![cell, text]);
    }

    #[test]
    fn same_layer_objects_keep_creation_order() {
        let mut canvas = canvas();
        let first = canvas.draw_grid_object(Vec2::ZERO, Shape::Square, Layer::ROBOTS, fill());
        let second = canvas.draw_grid_object(Vec2::ONE, Shape::Circle, Layer::ROBOTS, fill());
        canvas.raise_layers();

        let order: Vec<_> = canvas.paint_order().map(|(handle, _)| handle).collect();
        assert_eq!(order, vec![first, second]);
    }

    #[test]
    fn removal_counts_only_live_objects() {
        let mut canvas = canvas();
        let handle = canvas.draw_line(
            Vec2::ZERO,
            Vec2::ONE,
            Vec2::ZERO,
            Layer::ARROWS,
            Style::stroked(Color::from_rgb_u8(0, 0, 0), 1.0),
        );

        canvas.remove_object(handle);
        canvas.remove_object(handle);

        assert!(!canvas.contains(handle));
        assert_eq!(canvas.removed_count(), 1);
        assert!(canvas.is_empty());
        assert_eq!(canvas.paint_order().count(), 0);
    }

    #[test]
    fn clear_drops_every_object() {
        let mut canvas = canvas();
        let _ = canvas.draw_grid_object(Vec2::ZERO, Shape::Square, Layer::BACKGROUND, fill());
        let _ = canvas.draw_text(Vec2::ZERO, "0", Color::from_rgb_u8(0, 0, 0));
        assert_eq!(canvas.count_on_layer(Layer::TEXT), 1);

        canvas.clear();

        assert!(canvas.is_empty());
        assert_eq!(canvas.count_on_layer(Layer::BACKGROUND), 0);
    }
}
