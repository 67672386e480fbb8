//! Static map geometry.
//!
//! Maps are authored as JSON: obstacle polygons as flat vertex lists, loot
//! spots and player spawns as flat coordinate lists, plus the playable
//! bounds. Everything here is immutable after load and shared via `Arc`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use melee_arena_geom::sweep::{self, Event};
use melee_arena_geom::{Polygon, Vec2};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("unable to read map file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed map description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("obstacle #{0} has {1} coordinates, expected an even count of at least 6")]
    BadObstacle(usize, usize),

    #[error("{0} has an odd coordinate count: {1}")]
    OddCoordinateList(&'static str, usize),

    #[error("map borders must be positive, got {0}x{1}")]
    BadBorders(f32, f32),
}

#[derive(Deserialize)]
struct ObstacleDescription {
    vertexes: Vec<f32>,
}

#[derive(Deserialize)]
struct MapDescription {
    entities: Vec<ObstacleDescription>,
    loot_spots: Vec<f32>,
    player_spawns: Vec<f32>,
    map_border_x: f32,
    map_border_y: f32,
}

/// A loaded map: obstacle polygons with their pre-sorted X-interval events,
/// loot and spawn points, and the playable bounds.
pub struct Map {
    obstacles: Vec<Polygon>,
    obstacle_events: Vec<Event<usize>>,
    loot_spots: Vec<Vec2>,
    player_spawns: Vec<Vec2>,
    border: Vec2,
}

impl Map {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, MapError> {
        let desc: MapDescription = serde_json::from_reader(reader)?;
        Self::from_description(desc)
    }

    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let desc: MapDescription = serde_json::from_str(json)?;
        Self::from_description(desc)
    }

    fn from_description(desc: MapDescription) -> Result<Self, MapError> {
        if desc.map_border_x <= 0.0 || desc.map_border_y <= 0.0 {
            return Err(MapError::BadBorders(desc.map_border_x, desc.map_border_y));
        }

        let mut obstacles = Vec::with_capacity(desc.entities.len());
        let mut obstacle_events = Vec::with_capacity(desc.entities.len() * 2);
        for (id, obstacle) in desc.entities.iter().enumerate() {
            let count = obstacle.vertexes.len();
            if count < 6 || count % 2 != 0 {
                return Err(MapError::BadObstacle(id, count));
            }
            let vertices = obstacle
                .vertexes
                .chunks_exact(2)
                .map(|pair| Vec2::new(pair[0], pair[1]))
                .collect();
            let polygon = Polygon::new(vertices);
            let aabb = polygon.aabb();
            obstacle_events.extend(Event::pair(id, aabb.min.x, aabb.max.x));
            obstacles.push(polygon);
        }
        sweep::sort_events(&mut obstacle_events);

        Ok(Self {
            obstacles,
            obstacle_events,
            loot_spots: points_from_flat(&desc.loot_spots, "loot_spots")?,
            player_spawns: points_from_flat(&desc.player_spawns, "player_spawns")?,
            border: Vec2::new(desc.map_border_x, desc.map_border_y),
        })
    }

    pub fn obstacles(&self) -> &[Polygon] {
        &self.obstacles
    }

    pub fn obstacle(&self, id: usize) -> &Polygon {
        &self.obstacles[id]
    }

    /// Ids of obstacles whose X extent overlaps `[min, max]`.
    pub fn obstacles_in_x_range(&self, min: f32, max: f32) -> Vec<usize> {
        sweep::query(&self.obstacle_events, min, max)
    }

    pub fn loot_spots(&self) -> &[Vec2] {
        &self.loot_spots
    }

    pub fn player_spawns(&self) -> &[Vec2] {
        &self.player_spawns
    }

    pub fn border(&self) -> Vec2 {
        self.border
    }
}

fn points_from_flat(flat: &[f32], what: &'static str) -> Result<Vec<Vec2>, MapError> {
    if flat.len() % 2 != 0 {
        return Err(MapError::OddCoordinateList(what, flat.len()));
    }
    Ok(flat
        .chunks_exact(2)
        .map(|pair| Vec2::new(pair[0], pair[1]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP_JSON: &str = r#"{
        "entities": [
            {"vertexes": [10, 10, 20, 10, 20, 20, 10, 20]},
            {"vertexes": [60, 0, 70, 0, 70, 90, 60, 90]}
        ],
        "loot_spots": [5, 5, 35, 40, 80, 80],
        "player_spawns": [50, 40, 80, 20, 30, 70, 5, 90],
        "map_border_x": 100,
        "map_border_y": 100
    }"#;

    #[test]
    fn loads_map() {
        let map = Map::from_json(MAP_JSON).unwrap();
        assert_eq!(map.obstacles().len(), 2);
        assert_eq!(map.loot_spots().len(), 3);
        assert_eq!(map.player_spawns().len(), 4);
        assert_eq!(map.border(), Vec2::new(100.0, 100.0));
        assert_eq!(map.obstacle(0).aabb().min, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn prunes_obstacles_by_x_range() {
        let map = Map::from_json(MAP_JSON).unwrap();
        assert_eq!(map.obstacles_in_x_range(0.0, 5.0), Vec::<usize>::new());
        assert_eq!(map.obstacles_in_x_range(12.0, 15.0), vec![0]);
        let mut both = map.obstacles_in_x_range(15.0, 65.0);
        both.sort_unstable();
        assert_eq!(both, vec![0, 1]);
    }

    #[test]
    fn rejects_odd_vertex_list() {
        let bad = r#"{
            "entities": [{"vertexes": [1, 2, 3, 4, 5]}],
            "loot_spots": [], "player_spawns": [],
            "map_border_x": 10, "map_border_y": 10
        }"#;
        assert!(matches!(
            Map::from_json(bad),
            Err(MapError::BadObstacle(0, 5))
        ));
    }

    #[test]
    fn rejects_odd_spawn_list() {
        let bad = r#"{
            "entities": [],
            "loot_spots": [1, 2, 3], "player_spawns": [],
            "map_border_x": 10, "map_border_y": 10
        }"#;
        assert!(matches!(
            Map::from_json(bad),
            Err(MapError::OddCoordinateList("loot_spots", 3))
        ));
    }
}
