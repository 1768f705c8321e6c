//! Hex coordinate system using axial coordinates (q, r).
//!
//! This module provides the foundational coordinate types for the board:
//! - `HexCoord`: Identifies individual hex tiles
//! - `VertexRef` / `VertexId`: Raw and canonical corners where settlements and cities stand
//! - `EdgeRef` / `EdgeId`: Raw and canonical sides where roads are placed
//!
//! Hexes are pointy-top. Corners are numbered clockwise from the top
//! (0 = Top .. 5 = TopLeft) and side `i` joins corners `i` and `i + 1`.
//! Up to three raw corner ids (and two raw side ids) name the same physical
//! point; the canonical id is the smallest raw id, ordered on `(q, r, index)`,
//! among the equivalents whose hex lies on the board. Any raw id a client
//! sends can therefore be normalized on its own, without a global vertex table.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Radius of the playable board: a hexagon of 19 hexes around the origin
pub const BOARD_RADIUS: u32 = 2;

/// A location id that does not follow the `q_r_v_i` / `q_r_e_i` format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed location id `{0}`")]
pub struct ParseLocationError(pub String);

/// Corner of a hex, clockwise from the top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VertexDirection {
    Top,
    TopRight,
    BottomRight,
    Bottom,
    BottomLeft,
    TopLeft,
}

impl VertexDirection {
    /// All corners in clockwise order starting from Top
    pub const ALL: [VertexDirection; 6] = [
        VertexDirection::Top,
        VertexDirection::TopRight,
        VertexDirection::BottomRight,
        VertexDirection::Bottom,
        VertexDirection::BottomLeft,
        VertexDirection::TopLeft,
    ];

    /// Local index (0..6)
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    fn rotated(self, steps: u8) -> Self {
        Self::ALL[((self.index() + steps) % 6) as usize]
    }

    /// The two sides meeting at this corner: the one ending here and the one starting here
    pub fn sides(self) -> [EdgeDirection; 2] {
        [
            EdgeDirection::ALL[((self.index() + 5) % 6) as usize],
            EdgeDirection::ALL[self.index() as usize],
        ]
    }
}

/// Direction of an edge relative to a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeDirection {
    /// Northeast edge (top-right)
    NorthEast,
    /// East edge (right)
    East,
    /// Southeast edge (bottom-right)
    SouthEast,
    /// Southwest edge (bottom-left)
    SouthWest,
    /// West edge (left)
    West,
    /// Northwest edge (top-left)
    NorthWest,
}

impl EdgeDirection {
    /// All edge directions in clockwise order starting from NorthEast
    pub const ALL: [EdgeDirection; 6] = [
        EdgeDirection::NorthEast,
        EdgeDirection::East,
        EdgeDirection::SouthEast,
        EdgeDirection::SouthWest,
        EdgeDirection::West,
        EdgeDirection::NorthWest,
    ];

    /// Local index (0..6)
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// The same side seen from the neighbouring hex
    pub fn opposite(self) -> Self {
        Self::ALL[((self.index() + 3) % 6) as usize]
    }

    /// The corners this side joins, in clockwise order
    pub fn corners(self) -> [VertexDirection; 2] {
        [
            VertexDirection::ALL[self.index() as usize],
            VertexDirection::ALL[((self.index() + 1) % 6) as usize],
        ]
    }
}

/// Axial coordinate for hex grid.
///
/// In axial coordinates:
/// - `q` increases going east (right)
/// - `r` increases going southeast
/// - The third coordinate `s` (not stored) satisfies: q + r + s = 0
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct HexCoord {
    /// Column (increases going east)
    pub q: i32,
    /// Row (increases going southeast)
    pub r: i32,
}

impl HexCoord {
    /// Create a new hex coordinate
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The six neighboring hexes, indexed like `EdgeDirection::ALL`
    pub fn neighbors(&self) -> [HexCoord; 6] {
        EdgeDirection::ALL.map(|dir| self.neighbor(dir))
    }

    /// Get the neighbor across a specific side
    pub fn neighbor(&self, direction: EdgeDirection) -> HexCoord {
        match direction {
            EdgeDirection::NorthEast => HexCoord::new(self.q + 1, self.r - 1),
            EdgeDirection::East => HexCoord::new(self.q + 1, self.r),
            EdgeDirection::SouthEast => HexCoord::new(self.q, self.r + 1),
            EdgeDirection::SouthWest => HexCoord::new(self.q - 1, self.r + 1),
            EdgeDirection::West => HexCoord::new(self.q - 1, self.r),
            EdgeDirection::NorthWest => HexCoord::new(self.q, self.r - 1),
        }
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = i64::from(self.q) - i64::from(other.q);
        let dr = i64::from(self.r) - i64::from(other.r);
        let ds = -dq - dr;
        ((dq.abs() + dr.abs() + ds.abs()) / 2).min(i64::from(u32::MAX)) as u32
    }

    /// Whether this hex is one of the 19 board hexes
    pub fn is_on_board(&self) -> bool {
        self.distance_to(&HexCoord::default()) <= BOARD_RADIUS
    }

    /// Get all six canonical vertices of this hex
    pub fn vertices(&self) -> [VertexId; 6] {
        VertexDirection::ALL.map(|corner| VertexRef::new(*self, corner).normalize())
    }

    /// Get all six canonical edges of this hex
    pub fn edges(&self) -> [EdgeId; 6] {
        EdgeDirection::ALL.map(|side| EdgeRef::new(*self, side).normalize())
    }
}

/// All hexes on the board, ordered by (q, r)
pub fn board_hexes() -> Vec<HexCoord> {
    let radius = BOARD_RADIUS as i32;
    (-radius..=radius)
        .flat_map(|q| (-radius..=radius).map(move |r| HexCoord::new(q, r)))
        .filter(HexCoord::is_on_board)
        .collect()
}

/// Every canonical vertex on the board
pub fn all_vertices() -> BTreeSet<VertexId> {
    board_hexes().iter().flat_map(HexCoord::vertices).collect()
}

/// Every canonical edge on the board
pub fn all_edges() -> BTreeSet<EdgeId> {
    board_hexes().iter().flat_map(HexCoord::edges).collect()
}

fn parse_location(text: &str, marker: &str) -> Result<(HexCoord, u8), ParseLocationError> {
    let malformed = || ParseLocationError(text.to_string());
    let parts: Vec<&str> = text.trim().split('_').collect();
    let [q, r, kind, index] = parts.as_slice() else {
        return Err(malformed());
    };
    if *kind != marker {
        return Err(malformed());
    }
    let q: i32 = q.parse().map_err(|_| malformed())?;
    let r: i32 = r.parse().map_err(|_| malformed())?;
    let index: u8 = index.parse().map_err(|_| malformed())?;
    // Only the board and the ring around it can name a board corner or side
    if q.unsigned_abs() > BOARD_RADIUS + 1 || r.unsigned_abs() > BOARD_RADIUS + 1 {
        return Err(malformed());
    }
    Ok((HexCoord::new(q, r), index))
}

/// A raw corner id as a client names it: one hex plus one of its six corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexRef {
    pub hex: HexCoord,
    pub corner: VertexDirection,
}

impl VertexRef {
    pub const fn new(hex: HexCoord, corner: VertexDirection) -> Self {
        Self { hex, corner }
    }

    /// The three raw ids naming this physical point (including self).
    ///
    /// Corner `v` is corner `v + 2` of the hex across side `v - 1`, and
    /// corner `v + 4` of the hex across side `v`.
    pub fn equivalents(&self) -> [VertexRef; 3] {
        let [incoming, outgoing] = self.corner.sides();
        [
            *self,
            VertexRef::new(self.hex.neighbor(incoming), self.corner.rotated(2)),
            VertexRef::new(self.hex.neighbor(outgoing), self.corner.rotated(4)),
        ]
    }

    /// Canonical id, or `None` if the point touches no board hex
    pub fn canonical(&self) -> Option<VertexId> {
        self.equivalents()
            .into_iter()
            .filter(|v| v.hex.is_on_board())
            .min()
            .map(VertexId)
    }

    fn normalize(self) -> VertexId {
        self.canonical().unwrap_or(VertexId(self))
    }
}

impl fmt::Display for VertexRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_v_{}", self.hex.q, self.hex.r, self.corner.index())
    }
}

impl FromStr for VertexRef {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hex, index) = parse_location(s, "v")?;
        let corner =
            VertexDirection::from_index(index).ok_or_else(|| ParseLocationError(s.to_string()))?;
        Ok(VertexRef::new(hex, corner))
    }
}

/// Canonical vertex id - the stable key for occupancy and connectivity.
///
/// Only obtainable through canonicalization, so two `VertexId`s are equal
/// exactly when they name the same physical corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(VertexRef);

impl VertexId {
    /// The raw id chosen as canonical
    pub fn raw(&self) -> VertexRef {
        self.0
    }

    fn equivalents_on_board(&self) -> impl Iterator<Item = VertexRef> {
        self.0
            .equivalents()
            .into_iter()
            .filter(|v| v.hex.is_on_board())
    }

    /// Board hexes that share this corner (1 to 3)
    pub fn touching_hexes(&self) -> Vec<HexCoord> {
        self.equivalents_on_board().map(|v| v.hex).collect()
    }

    /// Board edges ending at this corner: 3 in the interior, 2 on the outer rim
    pub fn attached_edges(&self) -> Vec<EdgeId> {
        let edges: BTreeSet<EdgeId> = self
            .equivalents_on_board()
            .flat_map(|v| v.corner.sides().map(|side| EdgeRef::new(v.hex, side)))
            .filter_map(|e| e.canonical())
            .collect();
        edges.into_iter().collect()
    }

    /// Corners one edge away (for the distance rule)
    pub fn neighbor_vertices(&self) -> Vec<VertexId> {
        let neighbors: BTreeSet<VertexId> = self
            .attached_edges()
            .iter()
            .flat_map(EdgeId::endpoints)
            .filter(|v| v != self)
            .collect();
        neighbors.into_iter().collect()
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for VertexId {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<VertexRef>()?
            .canonical()
            .ok_or_else(|| ParseLocationError(s.to_string()))
    }
}

impl Serialize for VertexId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VertexId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A raw side id as a client names it: one hex plus one of its six sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeRef {
    pub hex: HexCoord,
    pub side: EdgeDirection,
}

impl EdgeRef {
    pub const fn new(hex: HexCoord, side: EdgeDirection) -> Self {
        Self { hex, side }
    }

    /// The two raw ids naming this side (including self)
    pub fn equivalents(&self) -> [EdgeRef; 2] {
        [
            *self,
            EdgeRef::new(self.hex.neighbor(self.side), self.side.opposite()),
        ]
    }

    /// Canonical id, or `None` if neither bordering hex is on the board
    pub fn canonical(&self) -> Option<EdgeId> {
        self.equivalents()
            .into_iter()
            .filter(|e| e.hex.is_on_board())
            .min()
            .map(EdgeId)
    }

    fn normalize(self) -> EdgeId {
        self.canonical().unwrap_or(EdgeId(self))
    }
}

impl fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_e_{}", self.hex.q, self.hex.r, self.side.index())
    }
}

impl FromStr for EdgeRef {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hex, index) = parse_location(s, "e")?;
        let side =
            EdgeDirection::from_index(index).ok_or_else(|| ParseLocationError(s.to_string()))?;
        Ok(EdgeRef::new(hex, side))
    }
}

/// Canonical edge id - the stable key for road occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(EdgeRef);

impl EdgeId {
    /// The raw id chosen as canonical
    pub fn raw(&self) -> EdgeRef {
        self.0
    }

    /// Get the 2 vertices at the endpoints of this edge
    pub fn endpoints(&self) -> [VertexId; 2] {
        self.0
            .side
            .corners()
            .map(|corner| VertexRef::new(self.0.hex, corner).normalize())
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EdgeId {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<EdgeRef>()?
            .canonical()
            .ok_or_else(|| ParseLocationError(s.to_string()))
    }
}

impl Serialize for EdgeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EdgeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
