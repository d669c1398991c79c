use std::collections::HashMap;

use park_proto::Rgb;

pub const ZONE_VACANT: Rgb = Rgb(0, 255, 0);
pub const ZONE_OCCUPIED: Rgb = Rgb(0, 0, 255);

const PALETTE: [i128; 3] = [(1 << 11) - 1, (1 << 15) - 1, (1 << 20) - 1];

pub fn zone_color(occupied: bool) -> Rgb {
    if occupied { ZONE_OCCUPIED } else { ZONE_VACANT }
}

/// Class id to box colour. Known classes come from the table, anything else gets
/// a stable colour derived from the id.
#[derive(Debug, Clone)]
pub struct ClassPalette {
    table: HashMap<i32, Rgb>,
}

impl Default for ClassPalette {
    fn default() -> Self {
        let table = HashMap::from([
            (0, Rgb(85, 45, 255)),   // person
            (2, Rgb(222, 82, 175)),  // car
            (3, Rgb(0, 204, 255)),   // motorbike
            (5, Rgb(0, 149, 255)),   // bus
        ]);
        Self { table }
    }
}

impl ClassPalette {
    pub fn color_for(&self, class_id: i32) -> Rgb {
        self.table.get(&class_id).copied().unwrap_or_else(|| fallback_color(class_id))
    }
}

fn fallback_color(class_id: i32) -> Rgb {
    let l = class_id as i128;
    let k = l * l - l + 1;
    let c = |p: i128| (p * k).rem_euclid(255) as u8;
    Rgb(c(PALETTE[0]), c(PALETTE[1]), c(PALETTE[2]))
}

pub fn class_name(class_id: i32, names: &[String]) -> String {
    usize::try_from(class_id)
        .ok()
        .and_then(|i| names.get(i))
        .cloned()
        .unwrap_or_else(|| format!("class{}", class_id))
}

/// Overlay label, `"<track id>:<class name>"`.
pub fn label_for(track_id: u64, class_id: i32, names: &[String]) -> String {
    format!("{}:{}", track_id, class_name(class_id, names))
}
