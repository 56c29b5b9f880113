// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The document: a generational arena of art objects organized into layers.
//
// Handles (`ArtId`, `LayerId`) are index + generation pairs.  Removing an
// object bumps the slot generation, so a handle held across a removal fails
// the liveness check instead of resolving to whatever reuses the slot.  The
// removal/restore pairs on `Document` are the reversible primitives that the
// flattening transaction journal replays on rollback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use tracing::debug;

use flachwerk_core::config::DocumentFlattenSettings;
use flachwerk_core::error::{FlattenError, Result};
use flachwerk_core::types::{DocumentId, PaintOrder};

use crate::art::{ArtKind, ArtObject};

/// Handle to an art object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtId {
    index: u32,
    generation: u32,
}

/// Handle to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId {
    index: u32,
    generation: u32,
}

/// Where an attached art object lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtParent {
    Layer(LayerId),
    Group(ArtId),
}

/// A layer of the document.  `arts` is ordered back-to-front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub arts: Vec<ArtId>,
    /// Marker for scratch layers that receive flattened output.
    pub temporary_flattening: bool,
    pub visible: bool,
}

impl Layer {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arts: Vec::new(),
            temporary_flattening: false,
            visible: true,
        }
    }
}

/// Information about one object produced by flattening.
///
/// A linked EPS is always also a placed object, so flattening records one
/// snippet of each kind for it.  No relative ordering between snippets is
/// guaranteed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlatteningInfo {
    /// A linked EPS object in the flattened output.  `interacts` means the
    /// object participates in transparency and must be parsed into objects
    /// before being handed to a non-transparency-aware consumer; `parse_ok`
    /// means its original structure can still be recovered by parsing.
    LinkedEps {
        object: ArtId,
        interacts: bool,
        parse_ok: bool,
    },
    /// A placed art object in the flattened output.
    PlacedArt { object: ArtId },
}

/// A subtree removed from the document, with everything needed to put it
/// back exactly where it was.
#[derive(Debug, Clone)]
pub struct DetachedArt {
    pub parent: ArtParent,
    /// Index in the parent container at removal time.
    pub index: usize,
    /// Arena entries, root first.
    pub nodes: Vec<(ArtId, ArtObject)>,
}

impl DetachedArt {
    pub fn root(&self) -> ArtId {
        self.nodes[0].0
    }
}

/// A layer removed from the document, with its art, for restore.
#[derive(Debug, Clone)]
pub struct DetachedLayer {
    pub id: LayerId,
    /// Position in the layer stack at removal time (0 = bottom).
    pub position: usize,
    pub layer: Layer,
    /// Root subtrees in removal order; restore replays them in reverse.
    pub arts: Vec<DetachedArt>,
}

// ---------------------------------------------------------------------------
// Generational arena
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    fn insert(&mut self, value: T) -> (u32, u32) {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            (index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            (index, 0)
        }
    }

    fn get(&self, index: u32, generation: u32) -> Option<&T> {
        self.slots
            .get(index as usize)
            .filter(|s| s.generation == generation)
            .and_then(|s| s.value.as_ref())
    }

    fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut T> {
        self.slots
            .get_mut(index as usize)
            .filter(|s| s.generation == generation)
            .and_then(|s| s.value.as_mut())
    }

    fn remove(&mut self, index: u32, generation: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation || slot.value.is_none() {
            return None;
        }
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        value
    }

    /// Reinstate a previously removed entry under its original handle.
    /// The slot must currently be empty.
    fn restore(&mut self, index: u32, generation: u32, value: T) -> bool {
        let Some(slot) = self.slots.get_mut(index as usize) else {
            return false;
        };
        if slot.value.is_some() {
            return false;
        }
        slot.generation = generation;
        slot.value = Some(value);
        self.free.retain(|&i| i != index);
        true
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A single open document.  One flattening operation at a time; the
/// exclusive borrow taken by the flattening entry points enforces that
/// locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub settings: DocumentFlattenSettings,
    pub created_at: DateTime<Utc>,
    arts: Arena<ArtObject>,
    layers: Arena<Layer>,
    /// Layer stack, bottom-to-top.
    layer_order: Vec<LayerId>,
    /// Output-object info recorded by the most recent flattening run.
    flattening_info: Vec<FlatteningInfo>,
}

impl Document {
    /// A new document with a single empty layer.
    pub fn new() -> Self {
        let mut doc = Self {
            id: DocumentId::new(),
            settings: DocumentFlattenSettings::default(),
            created_at: Utc::now(),
            arts: Arena::default(),
            layers: Arena::default(),
            layer_order: Vec::new(),
            flattening_info: Vec::new(),
        };
        doc.add_layer("Layer 1");
        doc
    }

    // -- Layers --

    /// Create a new layer at the top of the stack.
    pub fn add_layer(&mut self, name: impl Into<String>) -> LayerId {
        let layer = Layer::new(name);
        let (index, generation) = self.layers.insert(layer);
        let id = LayerId { index, generation };
        self.layer_order.push(id);
        debug!(layer = ?id, "layer created");
        id
    }

    pub fn layer(&self, id: LayerId) -> Result<&Layer> {
        self.layers
            .get(id.index, id.generation)
            .ok_or(FlattenError::LayerMissing)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer> {
        self.layers
            .get_mut(id.index, id.generation)
            .ok_or(FlattenError::LayerMissing)
    }

    /// Layers bottom-to-top.
    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &Layer)> {
        self.layer_order
            .iter()
            .filter_map(|id| self.layers.get(id.index, id.generation).map(|l| (*id, l)))
    }

    /// The topmost layer, if any.
    pub fn top_layer(&self) -> Option<LayerId> {
        self.layer_order.last().copied()
    }

    /// Remove a layer and every subtree of art it contains.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<DetachedLayer> {
        let roots = self.layer(id)?.arts.clone();
        let mut arts = Vec::with_capacity(roots.len());
        for root in roots {
            arts.push(self.remove_subtree(root)?);
        }
        let position = self
            .layer_order
            .iter()
            .position(|l| *l == id)
            .ok_or(FlattenError::LayerMissing)?;
        self.layer_order.remove(position);
        let layer = self
            .layers
            .remove(id.index, id.generation)
            .ok_or(FlattenError::LayerMissing)?;
        debug!(layer = ?id, "layer removed");
        Ok(DetachedLayer {
            id,
            position,
            layer,
            arts,
        })
    }

    /// Reinstate a removed layer and its art under the original handles.
    pub fn restore_layer(&mut self, detached: DetachedLayer) -> Result<()> {
        let DetachedLayer {
            id,
            position,
            mut layer,
            arts,
        } = detached;
        // The layer's art list is rebuilt by the subtree restores below.
        layer.arts.clear();
        if !self.layers.restore(id.index, id.generation, layer) {
            return Err(FlattenError::LayerMissing);
        }
        let position = position.min(self.layer_order.len());
        self.layer_order.insert(position, id);
        for detached_art in arts.into_iter().rev() {
            self.restore_subtree(detached_art)?;
        }
        Ok(())
    }

    // -- Art objects --

    /// Insert an art object into the arena without attaching it anywhere.
    /// The object is invisible to traversal until attached.
    pub fn create_art(&mut self, art: ArtObject) -> ArtId {
        let (index, generation) = self.arts.insert(art);
        ArtId { index, generation }
    }

    /// Drop an unattached art object from the arena.  Counterpart of
    /// [`Document::create_art`] for rollback.
    pub fn discard_art(&mut self, id: ArtId) -> Result<ArtObject> {
        self.arts
            .remove(id.index, id.generation)
            .ok_or(FlattenError::ArtMissing)
    }

    pub fn art(&self, id: ArtId) -> Result<&ArtObject> {
        self.arts
            .get(id.index, id.generation)
            .ok_or(FlattenError::ArtMissing)
    }

    pub fn art_mut(&mut self, id: ArtId) -> Result<&mut ArtObject> {
        self.arts
            .get_mut(id.index, id.generation)
            .ok_or(FlattenError::ArtMissing)
    }

    /// Check that every handle in the set is live.
    pub fn resolve_set(&self, set: &[ArtId]) -> Result<()> {
        for id in set {
            self.art(*id)?;
        }
        Ok(())
    }

    /// Attach an unattached art object at the top (front) of a layer.
    pub fn attach_to_layer_top(&mut self, layer: LayerId, id: ArtId) -> Result<()> {
        self.art(id)?;
        self.layer_mut(layer)?.arts.push(id);
        Ok(())
    }

    /// Attach an unattached art object relative to an anchor.
    pub fn attach_relative(&mut self, id: ArtId, order: PaintOrder, anchor: ArtId) -> Result<()> {
        self.art(id)?;
        match order {
            PaintOrder::Above | PaintOrder::Below => {
                let (parent, index) = self
                    .find_parent(anchor)
                    .ok_or(FlattenError::ArtMissing)?;
                let at = match order {
                    PaintOrder::Above => index + 1,
                    _ => index,
                };
                self.container_mut(parent)?.insert(at, id);
            }
            PaintOrder::InsideOnTop | PaintOrder::InsideAtBottom => {
                let anchor_art = self.art_mut(anchor)?;
                let ArtKind::Group { children, .. } = &mut anchor_art.kind else {
                    return Err(FlattenError::AnchorNotContainer);
                };
                match order {
                    PaintOrder::InsideOnTop => children.push(id),
                    _ => children.insert(0, id),
                }
            }
        }
        Ok(())
    }

    /// Detach an art object from its container without touching the arena.
    pub fn detach_art(&mut self, id: ArtId) -> Result<(ArtParent, usize)> {
        let (parent, index) = self.find_parent(id).ok_or(FlattenError::ArtMissing)?;
        self.container_mut(parent)?.remove(index);
        Ok((parent, index))
    }

    /// Remove an attached subtree: detach the root and drop the root and all
    /// its descendants from the arena.
    pub fn remove_subtree(&mut self, id: ArtId) -> Result<DetachedArt> {
        let (parent, index) = self.detach_art(id)?;
        let order = self.subtree_ids(id)?;
        let mut nodes = Vec::with_capacity(order.len());
        for node_id in order {
            let art = self
                .arts
                .remove(node_id.index, node_id.generation)
                .ok_or(FlattenError::ArtMissing)?;
            nodes.push((node_id, art));
        }
        Ok(DetachedArt {
            parent,
            index,
            nodes,
        })
    }

    /// Reinstate a removed subtree under its original handles and position.
    pub fn restore_subtree(&mut self, detached: DetachedArt) -> Result<()> {
        let DetachedArt {
            parent,
            index,
            nodes,
        } = detached;
        let root = nodes[0].0;
        for (id, art) in nodes {
            if !self.arts.restore(id.index, id.generation, art) {
                return Err(FlattenError::ArtMissing);
            }
        }
        let container = self.container_mut(parent)?;
        let at = index.min(container.len());
        container.insert(at, root);
        Ok(())
    }

    /// Swap the value stored for a live art object, returning the previous
    /// one.  Children references in the old and new kinds must agree; this
    /// is a value-level edit, not a structural one.
    pub fn replace_art(&mut self, id: ArtId, art: ArtObject) -> Result<ArtObject> {
        let slot = self.art_mut(id)?;
        Ok(std::mem::replace(slot, art))
    }

    // -- Traversal and queries --

    /// Root-first ids of the subtree under `id` (including `id`).
    pub fn subtree_ids(&self, id: ArtId) -> Result<Vec<ArtId>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let art = self.art(current)?;
            out.push(current);
            if let ArtKind::Group { children, .. } = &art.kind {
                for child in children.iter().rev() {
                    stack.push(*child);
                }
            }
        }
        Ok(out)
    }

    /// Count the distinct spot colors used anywhere in the given subtrees.
    pub fn spot_color_count(&self, set: &[ArtId]) -> Result<usize> {
        let mut spots = BTreeSet::new();
        for id in set {
            for node in self.subtree_ids(*id)? {
                self.art(node)?.collect_spots(&mut spots);
            }
        }
        Ok(spots.len())
    }

    /// Whether any object in the given subtrees carries a linked mask.
    pub fn has_linked_mask(&self, set: &[ArtId]) -> Result<bool> {
        for id in set {
            for node in self.subtree_ids(*id)? {
                if let Some(mask) = &self.art(node)?.mask {
                    if mask.linked {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    /// Root art of a layer, back-to-front.
    pub fn layer_roots(&self, layer: LayerId) -> Result<Vec<ArtId>> {
        Ok(self.layer(layer)?.arts.clone())
    }

    /// Root art of every layer except `excluded`, back-to-front per layer,
    /// layers bottom-to-top.
    pub fn all_roots_except(&self, excluded: LayerId) -> Vec<ArtId> {
        self.layers()
            .filter(|(id, _)| *id != excluded)
            .flat_map(|(_, layer)| layer.arts.iter().copied())
            .collect()
    }

    fn find_parent(&self, id: ArtId) -> Option<(ArtParent, usize)> {
        for (layer_id, layer) in self.layers() {
            if let Some(index) = layer.arts.iter().position(|a| *a == id) {
                return Some((ArtParent::Layer(layer_id), index));
            }
        }
        for (index_u32, slot) in self.arts.slots.iter().enumerate() {
            let Some(art) = &slot.value else { continue };
            if let ArtKind::Group { children, .. } = &art.kind {
                if let Some(index) = children.iter().position(|c| *c == id) {
                    let group = ArtId {
                        index: index_u32 as u32,
                        generation: slot.generation,
                    };
                    return Some((ArtParent::Group(group), index));
                }
            }
        }
        None
    }

    fn container_mut(&mut self, parent: ArtParent) -> Result<&mut Vec<ArtId>> {
        match parent {
            ArtParent::Layer(layer) => Ok(&mut self.layer_mut(layer)?.arts),
            ArtParent::Group(group) => {
                let art = self.art_mut(group)?;
                let ArtKind::Group { children, .. } = &mut art.kind else {
                    return Err(FlattenError::AnchorNotContainer);
                };
                Ok(children)
            }
        }
    }

    // -- Flattening info record --

    /// Output-object info recorded by the most recent flattening run.
    pub fn flattening_info(&self) -> &[FlatteningInfo] {
        &self.flattening_info
    }

    /// Replace the recorded flattening info.  Called by the invoker after a
    /// successful run.
    pub fn set_flattening_info(&mut self, info: Vec<FlatteningInfo>) {
        self.flattening_info = info;
    }

    // -- Content digest --

    /// SHA-256 digest over the document's visible structure: layers in
    /// stacking order, each with its art subtrees fully expanded by content.
    /// Two documents with identical structure produce identical digests, so
    /// rollback can be verified by comparing digests.
    pub fn content_digest(&self) -> Result<String> {
        let mut layers = Vec::new();
        for (_, layer) in self.layers() {
            let arts = layer
                .arts
                .iter()
                .map(|id| self.art_value(*id))
                .collect::<Result<Vec<_>>>()?;
            layers.push(serde_json::json!({
                "name": layer.name,
                "temporary_flattening": layer.temporary_flattening,
                "visible": layer.visible,
                "arts": arts,
            }));
        }
        let bytes = serde_json::to_vec(&layers)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Content representation of one subtree: the serialized object with
    /// group children expanded in place of their handles.
    fn art_value(&self, id: ArtId) -> Result<serde_json::Value> {
        let art = self.art(id)?;
        let mut value = serde_json::to_value(art)?;
        if let ArtKind::Group { children, .. } = &art.kind {
            let nested = children
                .iter()
                .map(|c| self.art_value(*c))
                .collect::<Result<Vec<_>>>()?;
            value["kind"]["Group"]["children"] = serde_json::Value::Array(nested);
        }
        Ok(value)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
