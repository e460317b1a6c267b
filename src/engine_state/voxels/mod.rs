//! # Voxel Data
//!
//! Blocks, chunks and the world that holds them.
//!
//! ## Architecture
//!
//! * **Block**: block ids, face directions and the catalog of per-block properties
//! * **Chunk**: a 16x128x16 column of blocks with its column heights, lightmap and
//!   neighbour links
//! * **World**: the loaded chunks by position, and block edits routed to them
//!
//! ## Data Flow
//!
//! 1. World receives a block edit relative to some chunk
//! 2. World resolves the owning chunk through neighbour links and writes the block
//! 3. The owner and any neighbour sharing the edited edge are scheduled for
//!    regeneration
//! 4. Finished meshes are collected from the scheduler by the caller

pub mod block;
pub mod chunk;
pub mod world;
