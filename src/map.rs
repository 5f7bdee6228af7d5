use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

#[derive(Debug, Clone)]
pub struct Tile {
    passable: bool,
    pub neighbors: Vec<(usize, usize)>, // Accessible neighbors, including the tile itself (wait)
}

impl Tile {
    pub fn is_passable(&self) -> bool {
        self.passable
    }
}

/// Static 4-connected grid. Cells are addressed as `(row, col)`.
#[derive(Debug, Clone)]
pub struct Map {
    pub height: usize,
    pub width: usize,
    pub grid: Vec<Vec<Tile>>,
}

impl Map {
    /// Reads a map in the MovingAI `.map` format.
    pub fn from_file(path: &str) -> io::Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let _type = next_line(&mut lines)?;
        let height = parse_dimension(&next_line(&mut lines)?)?;
        let width = parse_dimension(&next_line(&mut lines)?)?;
        let _map = next_line(&mut lines)?;

        let mut rows = Vec::with_capacity(height);
        for line in lines.take(height) {
            rows.push(line?);
        }
        if rows.len() != height || rows.iter().any(|row| row.chars().count() != width) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("map body does not match declared size {height}x{width}"),
            ));
        }

        Ok(Self::from_rows(&rows))
    }

    /// Builds a map from text rows, where `.`, `G` and `S` are passable and
    /// everything else is an obstacle.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Self {
        let obstacles: Vec<Vec<bool>> = rows
            .iter()
            .map(|row| {
                row.as_ref()
                    .chars()
                    .map(|ch| !matches!(ch, '.' | 'G' | 'S'))
                    .collect()
            })
            .collect();
        Self::from_obstacles(&obstacles)
    }

    /// Builds a map from an obstacle grid (`true` = blocked).
    pub fn from_obstacles(obstacles: &[Vec<bool>]) -> Self {
        let height = obstacles.len();
        let width = obstacles.iter().map(Vec::len).max().unwrap_or(0);

        let grid = obstacles
            .iter()
            .map(|row| {
                (0..width)
                    .map(|y| Tile {
                        passable: !row.get(y).copied().unwrap_or(true),
                        neighbors: Vec::new(),
                    })
                    .collect()
            })
            .collect();

        let mut map = Map {
            height,
            width,
            grid,
        };
        map.initialize_neighbors();
        map
    }

    fn initialize_neighbors(&mut self) {
        for x in 0..self.height {
            for y in 0..self.width {
                if self.grid[x][y].passable {
                    self.grid[x][y].neighbors = self.get_neighbors(x, y);
                }
            }
        }
    }

    pub fn get_neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let directions = [(-1, 0), (1, 0), (0, -1), (0, 1), (0, 0)]; // Up, down, left, right, stay
        let mut neighbors = Vec::new();

        for &(dx, dy) in &directions {
            let new_x = x as i64 + dx;
            let new_y = y as i64 + dy;
            if new_x >= 0
                && new_y >= 0
                && self.is_free((new_x as usize, new_y as usize))
            {
                neighbors.push((new_x as usize, new_y as usize));
            }
        }

        neighbors
    }

    /// Precomputed successors of a free cell, in the fixed expansion order.
    pub fn neighbors(&self, position: (usize, usize)) -> &[(usize, usize)] {
        &self.grid[position.0][position.1].neighbors
    }

    pub fn in_bounds(&self, position: (usize, usize)) -> bool {
        position.0 < self.height && position.1 < self.width
    }

    pub fn is_free(&self, position: (usize, usize)) -> bool {
        self.in_bounds(position) && self.grid[position.0][position.1].is_passable()
    }

    /// Exact distance from every free cell to `goal`, ignoring other agents.
    /// Cells that cannot reach the goal keep `usize::MAX`.
    pub fn heuristic_bfs(&self, goal: (usize, usize)) -> Vec<Vec<usize>> {
        let mut heuristic = vec![vec![usize::MAX; self.width]; self.height];
        if !self.is_free(goal) {
            return heuristic;
        }

        let mut queue = VecDeque::new();
        heuristic[goal.0][goal.1] = 0;
        queue.push_back(goal);

        // Moves are symmetric, so forward neighbors double as predecessors.
        while let Some((x, y)) = queue.pop_front() {
            let next_cost = heuristic[x][y] + 1;
            for &(new_x, new_y) in &self.grid[x][y].neighbors {
                if heuristic[new_x][new_y] == usize::MAX {
                    heuristic[new_x][new_y] = next_cost;
                    queue.push_back((new_x, new_y));
                }
            }
        }

        heuristic
    }
}

fn next_line<B: BufRead>(lines: &mut io::Lines<B>) -> io::Result<String> {
    lines
        .next()
        .unwrap_or_else(|| Err(io::Error::new(io::ErrorKind::UnexpectedEof, "map header truncated")))
}

fn parse_dimension(line: &str) -> io::Result<usize> {
    line.split_whitespace()
        .last()
        .and_then(|value| value.parse::<usize>().ok())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("malformed map header line: {line:?}"),
            )
        })
}
