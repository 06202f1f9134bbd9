pub mod time;

use nanoid::nanoid;

/// Generate a collision-resistant identifier for stored records.
pub fn longid() -> String {
    nanoid!(21)
}
