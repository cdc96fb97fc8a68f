//! Vertex and net registries.
//!
//! Both registries are arenas pre-sized at construction. Vertices and nets
//! refer to each other through [`VertexId`] / [`NetId`] indices, so
//! membership never implies ownership and the annealing loop only ever
//! touches plain slices.

use crate::error::{PlaceError, Result};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable handle to a vertex of an [`AnnealState`](super::AnnealState).
    VertexId,
    "v"
);

define_id!(
    /// Opaque, copyable handle to a net of an [`AnnealState`](super::AnnealState).
    NetId,
    "n"
);

/// A circuit element to be placed.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub(crate) position: Option<(usize, usize)>,
    pub(crate) movable: bool,
    pub(crate) demand: Vec<i32>,
    pub(crate) nets: Vec<NetId>,
    max_nets: usize,
}

impl Vertex {
    /// Current cell, or `None` before the vertex is placed.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.position
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }

    pub fn is_placed(&self) -> bool {
        self.position.is_some()
    }

    /// Resource demand, one entry per resource type.
    pub fn demand(&self) -> &[i32] {
        &self.demand
    }

    /// Nets this vertex belongs to.
    pub fn nets(&self) -> &[NetId] {
        &self.nets
    }

    /// Maximum number of nets declared at creation.
    pub fn max_nets(&self) -> usize {
        self.max_nets
    }
}

/// A weighted hyperedge over vertices.
#[derive(Debug, Clone)]
pub struct Net {
    pub(crate) weight: f64,
    pub(crate) members: Vec<VertexId>,
    /// Cost at the current positions of `members`.
    pub(crate) cost: f64,
    max_members: usize,
}

impl Net {
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Member vertices in insertion order; the first is the source for
    /// star-shaped metrics.
    pub fn members(&self) -> &[VertexId] {
        &self.members
    }

    /// Cached cost at the current placement.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Maximum number of members declared at creation.
    pub fn max_members(&self) -> usize {
        self.max_members
    }
}

fn reserve<T>(what: &str, n: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)
        .map_err(|e| PlaceError::AllocationFailure(format!("{what}: {e}")))?;
    Ok(v)
}

/// Arena of vertices and nets with bidirectional membership.
#[derive(Debug, Clone)]
pub struct Registry {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) nets: Vec<Net>,
    max_vertices: usize,
    max_nets: usize,
    num_resource_types: usize,
}

/// Largest number of entities a 32-bit handle can address.
const MAX_HANDLES: usize = u32::MAX as usize;

fn check_handle_space(what: &'static str, n: usize) -> Result<()> {
    if n > MAX_HANDLES {
        return Err(PlaceError::CapacityExceeded {
            what,
            limit: MAX_HANDLES,
        });
    }
    Ok(())
}

impl Registry {
    /// Creates empty registries with room for exactly `max_vertices`
    /// vertices and `max_nets` nets.
    ///
    /// Handles are 32-bit, so either limit above `u32::MAX` fails with
    /// [`PlaceError::CapacityExceeded`] before anything is allocated.
    pub fn new(max_vertices: usize, max_nets: usize, num_resource_types: usize) -> Result<Self> {
        check_handle_space("vertices", max_vertices)?;
        check_handle_space("nets", max_nets)?;
        Ok(Self {
            vertices: reserve("vertices", max_vertices)?,
            nets: reserve("nets", max_nets)?,
            max_vertices,
            max_nets,
            num_resource_types,
        })
    }

    /// Allocates a vertex that may join at most `max_nets` nets.
    ///
    /// The vertex starts unplaced, movable and with zero demand.
    pub fn new_vertex(&mut self, max_nets: usize) -> Result<VertexId> {
        if self.vertices.len() >= self.max_vertices {
            return Err(PlaceError::CapacityExceeded {
                what: "vertices",
                limit: self.max_vertices,
            });
        }
        let mut demand = reserve("vertex demand", self.num_resource_types)?;
        demand.resize(self.num_resource_types, 0);
        let id = VertexId::from_raw(self.vertices.len() as u32);
        self.vertices.push(Vertex {
            position: None,
            movable: true,
            demand,
            nets: reserve("vertex nets", max_nets)?,
            max_nets,
        });
        Ok(id)
    }

    /// Allocates a net of unit weight holding at most `max_members` vertices.
    pub fn new_net(&mut self, max_members: usize) -> Result<NetId> {
        if self.nets.len() >= self.max_nets {
            return Err(PlaceError::CapacityExceeded {
                what: "nets",
                limit: self.max_nets,
            });
        }
        let id = NetId::from_raw(self.nets.len() as u32);
        self.nets.push(Net {
            weight: 1.0,
            members: reserve("net members", max_members)?,
            cost: 0.0,
            max_members,
        });
        Ok(id)
    }

    /// Records `vertex` as a member of `net` and `net` as one of the nets of
    /// `vertex`. Neither side is modified when either is full.
    pub fn add_vertex_to_net(&mut self, net: NetId, vertex: VertexId) -> Result<()> {
        let v = self.vertex(vertex)?;
        if v.nets.len() >= v.max_nets {
            return Err(PlaceError::CapacityExceeded {
                what: "vertex nets",
                limit: v.max_nets,
            });
        }
        let n = self.net(net)?;
        if n.members.len() >= n.max_members {
            return Err(PlaceError::CapacityExceeded {
                what: "net members",
                limit: n.max_members,
            });
        }
        self.nets[net.index()].members.push(vertex);
        self.vertices[vertex.index()].nets.push(net);
        Ok(())
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices
            .get(id.index())
            .ok_or(PlaceError::UnknownVertex(id))
    }

    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex> {
        self.vertices
            .get_mut(id.index())
            .ok_or(PlaceError::UnknownVertex(id))
    }

    pub fn net(&self, id: NetId) -> Result<&Net> {
        self.nets.get(id.index()).ok_or(PlaceError::UnknownNet(id))
    }

    pub(crate) fn net_mut(&mut self, id: NetId) -> Result<&mut Net> {
        self.nets.get_mut(id.index()).ok_or(PlaceError::UnknownNet(id))
    }

    /// Number of vertices created so far.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of nets created so far.
    pub fn num_nets(&self) -> usize {
        self.nets.len()
    }

    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    pub fn max_nets(&self) -> usize {
        self.max_nets
    }

    /// All vertex handles in creation order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len() as u32).map(VertexId::from_raw)
    }

    /// All net handles in creation order.
    pub fn net_ids(&self) -> impl Iterator<Item = NetId> + '_ {
        (0..self.nets.len() as u32).map(NetId::from_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip_and_display() {
        let v = VertexId::from_raw(42);
        assert_eq!(v.as_raw(), 42);
        assert_eq!(v.to_string(), "v42");
        assert_eq!(NetId::from_raw(9).to_string(), "n9");
    }

    #[test]
    fn test_vertex_capacity() {
        let mut r = Registry::new(2, 0, 1).unwrap();
        r.new_vertex(0).unwrap();
        r.new_vertex(0).unwrap();
        assert_eq!(
            r.new_vertex(0),
            Err(PlaceError::CapacityExceeded {
                what: "vertices",
                limit: 2
            })
        );
    }

    #[test]
    fn test_net_capacity() {
        let mut r = Registry::new(0, 1, 1).unwrap();
        r.new_net(3).unwrap();
        assert!(matches!(
            r.new_net(3),
            Err(PlaceError::CapacityExceeded { what: "nets", .. })
        ));
    }

    #[test]
    fn test_new_vertex_defaults() {
        let mut r = Registry::new(1, 0, 3).unwrap();
        let v = r.new_vertex(2).unwrap();
        let vertex = r.vertex(v).unwrap();
        assert_eq!(vertex.demand(), &[0, 0, 0]);
        assert!(vertex.is_movable());
        assert!(!vertex.is_placed());
        assert_eq!(vertex.max_nets(), 2);
    }

    /// Vertex `i` joins nets `0..=i`; net `i` holds vertices `i..nv`.
    #[test]
    fn test_bidirectional_membership() {
        let nv = 4;
        let nn = 4;
        let mut r = Registry::new(nv, nn, 2).unwrap();
        let vs: Vec<_> = (0..nv).map(|i| r.new_vertex(i + 1).unwrap()).collect();
        let ns: Vec<_> = (0..nn).map(|i| r.new_net(nv - i).unwrap()).collect();
        for (i, &n) in ns.iter().enumerate() {
            for &v in &vs[i..] {
                r.add_vertex_to_net(n, v).unwrap();
            }
        }

        for (i, &n) in ns.iter().enumerate() {
            assert_eq!(r.net(n).unwrap().members(), &vs[i..]);
        }
        for (i, &v) in vs.iter().enumerate() {
            assert_eq!(r.vertex(v).unwrap().nets(), &ns[..=i]);
        }
    }

    #[test]
    fn test_add_to_full_net_leaves_both_sides_untouched() {
        let mut r = Registry::new(2, 1, 1).unwrap();
        let a = r.new_vertex(1).unwrap();
        let b = r.new_vertex(1).unwrap();
        let n = r.new_net(1).unwrap();
        r.add_vertex_to_net(n, a).unwrap();
        assert!(matches!(
            r.add_vertex_to_net(n, b),
            Err(PlaceError::CapacityExceeded {
                what: "net members",
                limit: 1
            })
        ));
        assert!(r.vertex(b).unwrap().nets().is_empty());
        assert_eq!(r.net(n).unwrap().members(), &[a]);
    }

    #[test]
    fn test_add_to_full_vertex() {
        let mut r = Registry::new(1, 2, 1).unwrap();
        let v = r.new_vertex(1).unwrap();
        let n0 = r.new_net(1).unwrap();
        let n1 = r.new_net(1).unwrap();
        r.add_vertex_to_net(n0, v).unwrap();
        assert!(matches!(
            r.add_vertex_to_net(n1, v),
            Err(PlaceError::CapacityExceeded {
                what: "vertex nets",
                ..
            })
        ));
        assert!(r.net(n1).unwrap().members().is_empty());
    }

    #[test]
    fn test_unknown_handles() {
        let mut r = Registry::new(1, 1, 1).unwrap();
        let n = r.new_net(1).unwrap();
        let ghost = VertexId::from_raw(5);
        assert_eq!(
            r.add_vertex_to_net(n, ghost),
            Err(PlaceError::UnknownVertex(ghost))
        );
        assert!(r.net(NetId::from_raw(1)).is_err());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_limits_beyond_handle_space() {
        let too_many = u32::MAX as usize + 1;
        assert_eq!(
            Registry::new(too_many, 0, 1).err(),
            Some(PlaceError::CapacityExceeded {
                what: "vertices",
                limit: u32::MAX as usize,
            })
        );
        assert_eq!(
            Registry::new(0, too_many, 1).err(),
            Some(PlaceError::CapacityExceeded {
                what: "nets",
                limit: u32::MAX as usize,
            })
        );
    }
}
