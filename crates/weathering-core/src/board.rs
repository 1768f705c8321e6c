//! Board representation: tiles, resources and the constructions placed on them.
//!
//! This module contains:
//! - Resource and tile types
//! - Randomized generation of the fixed 19-hex layout
//! - Construction records (roads, settlements, cities) keyed by canonical site

use crate::hex::{EdgeId, HexCoord, VertexId};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Player identifier (index into the player list)
pub type PlayerId = u8;

/// The five producible resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Wood,
    Brick,
    Sheep,
    Wheat,
    Ore,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Ore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Wood => "wood",
            Resource::Brick => "brick",
            Resource::Sheep => "sheep",
            Resource::Wheat => "wheat",
            Resource::Ore => "ore",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown resource `{s}`"))
    }
}

/// Type of hex tile on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    /// Produces a resource when its number is rolled
    Resource(Resource),
    /// Never produces, carries no number token
    Desert,
}

/// A single hex tile on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Position on the hex grid
    pub coord: HexCoord,
    pub tile_type: TileType,
    /// Dice number that triggers production (None for the desert)
    pub number_token: Option<u8>,
}

impl Tile {
    /// Create a new resource tile
    pub fn new_resource(coord: HexCoord, resource: Resource, number_token: u8) -> Self {
        Self {
            coord,
            tile_type: TileType::Resource(resource),
            number_token: Some(number_token),
        }
    }

    /// Create a desert tile
    pub fn desert(coord: HexCoord) -> Self {
        Self {
            coord,
            tile_type: TileType::Desert,
            number_token: None,
        }
    }

    /// Get the resource this tile produces, if any
    pub fn resource(&self) -> Option<Resource> {
        match self.tile_type {
            TileType::Resource(r) => Some(r),
            TileType::Desert => None,
        }
    }

    pub fn is_desert(&self) -> bool {
        self.tile_type == TileType::Desert
    }
}

/// The fixed board layout: centre, inner ring, outer ring (spiral order)
pub const STANDARD_LAYOUT: [HexCoord; 19] = [
    HexCoord::new(0, 0),
    HexCoord::new(1, 0),
    HexCoord::new(1, -1),
    HexCoord::new(0, -1),
    HexCoord::new(-1, 0),
    HexCoord::new(-1, 1),
    HexCoord::new(0, 1),
    HexCoord::new(2, 0),
    HexCoord::new(2, -1),
    HexCoord::new(2, -2),
    HexCoord::new(1, -2),
    HexCoord::new(0, -2),
    HexCoord::new(-1, -1),
    HexCoord::new(-2, 0),
    HexCoord::new(-2, 1),
    HexCoord::new(-2, 2),
    HexCoord::new(-1, 2),
    HexCoord::new(0, 2),
    HexCoord::new(1, 1),
];

/// Number tokens for the 18 producing tiles
pub const NUMBER_TOKENS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

/// How many tiles of each resource the board carries
const RESOURCE_COUNTS: [(Resource, usize); 5] = [
    (Resource::Wood, 4),
    (Resource::Sheep, 4),
    (Resource::Wheat, 4),
    (Resource::Brick, 3),
    (Resource::Ore, 3),
];

/// The game board: 19 tiles, immutable once generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    tiles: Vec<Tile>,
}

impl Board {
    /// Generate a board with shuffled resources and number tokens
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let mut tile_types: Vec<TileType> = RESOURCE_COUNTS
            .iter()
            .flat_map(|&(resource, count)| {
                std::iter::repeat(TileType::Resource(resource)).take(count)
            })
            .collect();
        tile_types.push(TileType::Desert);
        tile_types.shuffle(rng);

        let mut numbers = NUMBER_TOKENS.to_vec();
        numbers.shuffle(rng);
        let mut numbers = numbers.into_iter();

        let tiles = STANDARD_LAYOUT
            .iter()
            .zip(tile_types)
            .map(|(&coord, tile_type)| match tile_type {
                TileType::Desert => Tile::desert(coord),
                TileType::Resource(_) => Tile {
                    coord,
                    tile_type,
                    number_token: numbers.next(),
                },
            })
            .collect();

        Self { tiles }
    }

    /// Build a board from explicit tiles (fixtures, stored games)
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Get a tile by coordinate
    pub fn get_tile(&self, coord: &HexCoord) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.coord == *coord)
    }

    /// Replace the tile at the same coordinate, or add it
    pub fn upsert_tile(&mut self, tile: Tile) {
        match self.tiles.iter_mut().find(|t| t.coord == tile.coord) {
            Some(existing) => *existing = tile,
            None => self.tiles.push(tile),
        }
    }

    /// The desert tile, where the robber starts
    pub fn desert(&self) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.is_desert())
    }

    /// Tiles carrying the given number token
    pub fn tiles_with_token(&self, number: u8) -> impl Iterator<Item = &Tile> {
        self.tiles
            .iter()
            .filter(move |t| t.number_token == Some(number))
    }
}

/// Kind of construction a player can place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionKind {
    Road,
    Settlement,
    City,
}

impl ConstructionKind {
    /// Victory points provided by this construction
    pub fn victory_points(&self) -> u32 {
        match self {
            ConstructionKind::Road => 0,
            ConstructionKind::Settlement => 1,
            ConstructionKind::City => 2,
        }
    }

    /// Resource multiplier (how many resources per production)
    pub fn resource_multiplier(&self) -> u32 {
        match self {
            ConstructionKind::Road => 0,
            ConstructionKind::Settlement => 1,
            ConstructionKind::City => 2,
        }
    }

    /// Whether this kind stands on a vertex
    pub fn is_building(&self) -> bool {
        !matches!(self, ConstructionKind::Road)
    }
}

/// Canonical location of a construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Site {
    Vertex(VertexId),
    Edge(EdgeId),
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::Vertex(v) => v.fmt(f),
            Site::Edge(e) => e.fmt(f),
        }
    }
}

/// A placed road, settlement or city
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Construction {
    pub kind: ConstructionKind,
    pub site: Site,
    /// The location id as the player sent it, kept for display
    pub raw_location: String,
    pub owner: PlayerId,
}

/// All constructions of one game, at most one per canonical site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Constructions {
    items: Vec<Construction>,
}

impl Constructions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Construction> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The construction occupying a site, if any
    pub fn at(&self, site: &Site) -> Option<&Construction> {
        self.items.iter().find(|c| c.site == *site)
    }

    /// Settlement or city on a vertex
    pub fn building_at(&self, vertex: &VertexId) -> Option<&Construction> {
        self.at(&Site::Vertex(*vertex))
    }

    /// Road on an edge
    pub fn road_at(&self, edge: &EdgeId) -> Option<&Construction> {
        self.at(&Site::Edge(*edge))
    }

    pub fn building_owner(&self, vertex: &VertexId) -> Option<PlayerId> {
        self.building_at(vertex).map(|c| c.owner)
    }

    pub fn road_owner(&self, edge: &EdgeId) -> Option<PlayerId> {
        self.road_at(edge).map(|c| c.owner)
    }

    /// Number of constructions of a kind owned by a player
    pub fn count(&self, owner: PlayerId, kind: ConstructionKind) -> usize {
        self.items
            .iter()
            .filter(|c| c.owner == owner && c.kind == kind)
            .count()
    }

    /// All roads owned by a player
    pub fn roads_of(&self, owner: PlayerId) -> Vec<EdgeId> {
        self.items
            .iter()
            .filter(|c| c.owner == owner)
            .filter_map(|c| match c.site {
                Site::Edge(e) => Some(e),
                Site::Vertex(_) => None,
            })
            .collect()
    }

    /// Check if a vertex satisfies the distance rule (no adjacent buildings)
    pub fn satisfies_distance_rule(&self, vertex: &VertexId) -> bool {
        vertex
            .neighbor_vertices()
            .iter()
            .all(|adj| self.building_at(adj).is_none())
    }

    /// Record a new construction (placement validation happens upstream)
    pub fn insert(&mut self, construction: Construction) {
        self.items.push(construction);
    }

    /// Change the kind of the construction at a site; false if nothing is there
    pub fn set_kind(&mut self, site: &Site, kind: ConstructionKind) -> bool {
        match self.items.iter_mut().find(|c| c.site == *site) {
            Some(existing) => {
                existing.kind = kind;
                true
            }
            None => false,
        }
    }
}
