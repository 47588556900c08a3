//! Built-in exhibition halls
//!
//! Five halls: the entrance lobby, one hall per creative period and the
//! closing hall. Tables use hall-local coordinates with the floor centred on
//! the origin; the long axis runs along Z.

use crate::foundation::color::Color;
use crate::foundation::math::{constants::PI, Vec3};
use crate::hall::config::{
    AchievementConfig, AreaBuilderSpec, AreaConfig, ArtworkConfig, EntranceMarkerConfig, FeaturePanelConfig,
    HallConfig, InfoPanelConfig, PartitionWallConfig, SurfaceMaterials,
};
use crate::render::lighting::light::{AMBIENT_GROUP, MAIN_GROUP};
use crate::render::lighting::LightSpec;
use crate::render::material::MaterialParams;

/// Ids of the built-in halls in tour order
pub const HALL_IDS: [&str; 5] = ["entrance", "early", "middle", "late", "end"];

/// Every built-in hall in tour order
pub fn builtin_halls() -> Vec<HallConfig> {
    vec![entrance(), early(), middle(), late(), end()]
}

/// Built-in hall by id
pub fn builtin_hall(id: &str) -> Option<HallConfig> {
    match id {
        "entrance" => Some(entrance()),
        "early" => Some(early()),
        "middle" => Some(middle()),
        "late" => Some(late()),
        "end" => Some(end()),
        _ => None,
    }
}

/// Hall id for a 1-based tour position
pub fn hall_for_digit(digit: u8) -> Option<&'static str> {
    usize::from(digit)
        .checked_sub(1)
        .and_then(|index| HALL_IDS.get(index).copied())
}

// ===== Table helpers =====

fn surfaces(wall: (u32, f32, f32), floor: (u32, f32, f32), ceiling: (u32, f32, f32)) -> SurfaceMaterials {
    SurfaceMaterials {
        wall: MaterialParams::surface(wall.0, wall.1, wall.2),
        floor: MaterialParams::surface(floor.0, floor.1, floor.2).with_opacity(0.9),
        ceiling: MaterialParams::surface(ceiling.0, ceiling.1, ceiling.2),
    }
}

fn ambient(color: u32, intensity: f32) -> LightSpec {
    LightSpec::preset("ambient")
        .color(color)
        .intensity(intensity)
        .group(AMBIENT_GROUP)
}

fn directional(color: u32, intensity: f32, position: Vec3) -> LightSpec {
    LightSpec::preset("directional")
        .color(color)
        .intensity(intensity)
        .position(position)
        .group(MAIN_GROUP)
}

fn panel(id: &str, title: &str, lines: [&str; 3], position: Vec3, size: (f32, f32)) -> InfoPanelConfig {
    InfoPanelConfig {
        id: id.into(),
        title: title.into(),
        body: lines.join("\n"),
        position,
        rotation_y: PI,
        width: size.0,
        height: size.1,
    }
}

fn marker(destination: &str, label: &str, position: Vec3) -> EntranceMarkerConfig {
    EntranceMarkerConfig {
        destination: destination.into(),
        label: label.into(),
        position,
    }
}

fn painting(id: u32, title: &str, file: &str, year: &str, area: &str, description: &str) -> ArtworkConfig {
    ArtworkConfig {
        id: id.to_string(),
        title: title.into(),
        year: year.into(),
        description: description.into(),
        image_url: Some(format!("/images/{file}.jpg")),
        area: Some(area.into()),
        ..ArtworkConfig::default()
    }
}

fn area(id: &str, name: &str, year: &str, description: &str, z: f32) -> AreaConfig {
    AreaConfig {
        id: id.into(),
        name: name.into(),
        year: year.into(),
        description: description.into(),
        center: Vec3::new(0.0, 0.0, z),
    }
}

/// 16 x 80 x 12 period hall with the shared camera and lighting layout
fn period_hall(id: &str, name: &str, description: &str) -> HallConfig {
    HallConfig::new(id, 16.0, 80.0, 12.0)
        .with_name(name, description)
        .with_camera(Vec3::new(0.0, 4.0, -30.0), Vec3::new(0.0, 4.0, 30.0))
        .with_builder(AreaBuilderSpec::WallGallery)
        .with_builder(AreaBuilderSpec::ArtworkSpotlights)
}

fn period_lighting(ambient_color: u32, ambient_intensity: f32, key_color: u32, key_intensity: f32) -> Vec<LightSpec> {
    vec![
        ambient(ambient_color, ambient_intensity),
        directional(key_color, key_intensity, Vec3::new(-8.0, 4.0, 0.0)),
        directional(key_color, key_intensity, Vec3::new(11.0, 4.0, 0.0)),
    ]
}

// ===== Halls =====

fn entrance() -> HallConfig {
    let mut hall = HallConfig::new("entrance", 24.0, 50.0, 10.0)
        .with_name("Entrance Hall", "Introduction to the artist and the exhibition")
        .with_camera(Vec3::new(0.0, 4.0, -17.0), Vec3::new(0.0, 4.0, 10.0))
        .with_builder(AreaBuilderSpec::WallGallery);
    hall.wall_thickness = 0.2;
    hall.materials = SurfaceMaterials {
        wall: MaterialParams::surface(0xfff5f0, 0.6, 0.1),
        floor: MaterialParams::surface(0xf0e6d2, 0.2, 0.7).with_opacity(0.9),
        ceiling: MaterialParams::surface(0xfff5f0, 0.8, 0.5),
    };
    hall.lighting = vec![
        ambient(0xfffff0, 0.8),
        directional(0xfff8e1, 2.0, Vec3::new(0.0, 15.0, -5.0)),
    ];

    let mut panels = vec![
        panel(
            "artist",
            "Huang Binhong",
            [
                "1865 - 1955",
                "Master of Chinese landscape painting",
                "Painter and calligrapher of modern China.\nBorn Maozhi, courtesy name Pucun.",
            ],
            Vec3::new(0.0, 4.0, -5.0),
            (10.0, 6.0),
        ),
        panel(
            "guide",
            "Exhibition guide",
            [
                "Permanent exhibition",
                "Three period halls",
                "Early hall (1865-1930): sparse and elegant\nMiddle hall (1930-1948): rich and lush\nLate hall (1948-1955): dark and dense",
            ],
            Vec3::new(-9.0, 4.0, 0.0),
            (6.0, 7.0),
        ),
        panel(
            "achievements",
            "Achievements",
            [
                "Lifetime contribution",
                "Synthesiser of Chinese landscape painting",
                "Formulated the theory of five brush methods and seven ink methods and left thousands of works.",
            ],
            Vec3::new(9.0, 4.0, 0.0),
            (6.0, 7.0),
        ),
        panel(
            "tips",
            "Visitor tips",
            [
                "Before you start",
                "How to move around",
                "Use W/S or the arrow keys to walk\nClick an entrance marker to enter a hall\nVisit the halls from early to late",
            ],
            Vec3::new(0.0, 3.0, 5.0),
            (8.0, 5.0),
        ),
    ];
    for panel in &mut panels {
        panel.rotation_y = 0.0;
    }
    hall.info_panels = panels;

    hall.entrance_markers = vec![
        marker("early", "Early hall\n1865-1930", Vec3::new(-6.0, 0.0, 10.0)),
        marker("middle", "Middle hall\n1930-1948", Vec3::new(0.0, 0.0, 10.0)),
        marker("late", "Late hall\n1948-1955", Vec3::new(6.0, 0.0, 10.0)),
    ];
    hall
}

fn early() -> HallConfig {
    let mut hall = period_hall("early", "Early Hall", "Sparse and elegant: the white period")
        .with_builder(AreaBuilderSpec::PartitionWalls(vec![
            PartitionWallConfig {
                x: -4.0,
                z: -15.0,
                ..PartitionWallConfig::default()
            },
            PartitionWallConfig {
                x: 4.0,
                z: 15.0,
                ..PartitionWallConfig::default()
            },
        ]));
    hall.wall_thickness = 0.1;
    hall.materials = surfaces((0xfffaf0, 0.5, 0.1), (0xf5f0e6, 0.3, 0.5), (0xfffaf0, 0.7, 0.4));
    hall.lighting = period_lighting(0xfffff8, 0.9, 0xfffaf0, 2.5);

    hall.areas = vec![
        area("xinan", "Xin'an school", "1870-1890", "Early study of the Xin'an painters", -30.0),
        area("flower", "Flower painting", "1890-1910", "Bird-and-flower studies from life", 0.0),
        area("transition", "Change of style", "1910-1930", "From white towards yellow", 30.0),
    ];
    hall.artworks = vec![
        painting(1, "Spring Mountains, Red Trees", "spring_mountains_red_trees", "1885-1890", "xinan", ""),
        painting(2, "Green Hills, Ancient Temple", "green_hills_ancient_temple", "1890-1895", "xinan", ""),
        painting(3, "Summer Flowers", "summer_flowers", "1895-1900", "xinan", ""),
        painting(4, "Peony and Begonia", "peony_and_begonia", "1900-1905", "flower", ""),
        painting(5, "Wisteria and Hydrangea", "wisteria_and_hydrangea", "1905-1910", "flower", ""),
        painting(6, "Spring Flowers", "spring_flowers", "1910-1915", "flower", ""),
        painting(7, "Landscape Sketch", "landscape_sketch", "1915-1920", "transition", ""),
        painting(8, "Ink Bamboo", "ink_bamboo", "1920-1925", "transition", ""),
        painting(9, "Autumn Mountains", "autumn_mountains", "1925-1930", "transition", ""),
    ];

    hall.info_panels = vec![
        panel(
            "period",
            "Early: sparse and elegant",
            [
                "1865-1930",
                "The white period",
                "Light brushwork, pale colour and generous empty space, rooted in the Xin'an school.",
            ],
            Vec3::new(0.0, 5.0, -20.0),
            (8.0, 7.0),
        ),
        panel(
            "xinan",
            "Following Xin'an",
            [
                "1870-1890",
                "Years of study",
                "Learned from Jianjiang and Zha Shibiao; clear, dry and restrained ink.",
            ],
            Vec3::new(-6.0, 4.0, 0.0),
            (5.0, 6.0),
        ),
        panel(
            "flowers",
            "Flowers from life",
            [
                "1890-1910",
                "Bird-and-flower practice",
                "Nimble strokes and pale colour capturing living nature.",
            ],
            Vec3::new(6.0, 4.0, 0.0),
            (5.0, 6.0),
        ),
        panel(
            "turn",
            "From white to yellow",
            [
                "1910-1930",
                "Change of style",
                "Deeper ink exploration lays the ground for the mature style.",
            ],
            Vec3::new(0.0, 5.0, 20.0),
            (8.0, 7.0),
        ),
    ];
    hall.entrance_markers = vec![
        marker("entrance", "Back to the entrance", Vec3::new(0.0, 0.0, -35.0)),
        marker("middle", "On to the middle hall", Vec3::new(0.0, 0.0, 35.0)),
    ];
    hall
}

fn middle() -> HallConfig {
    let mut hall = period_hall("middle", "Middle Hall", "Rich and lush: the yellow period").with_builder(
        AreaBuilderSpec::Panorama(FeaturePanelConfig {
            name: "panorama".into(),
            title: "Panorama".into(),
            description: "Huangshan sketches shown in the round".into(),
            position: Vec3::new(6.0, 3.0, 0.0),
            rotation_y: -PI / 2.0,
            ..FeaturePanelConfig::default()
        }),
    );
    hall.materials = surfaces((0xfff5e6, 0.6, 0.1), (0xf0e6d2, 0.2, 0.7), (0xfff5e6, 0.8, 0.5));
    hall.lighting = period_lighting(0xfffff0, 0.8, 0xfff8e1, 2.5);

    hall.areas = vec![
        area("ink-training", "Ink training", "1930-1940", "Five brush methods, seven ink methods", -30.0),
        area("huangshan", "Huangshan", "1935-1948", "Sketching the Yellow Mountains", 0.0),
        area("maturity", "Maturity", "1940-1948", "The yellow tone fully formed", 30.0),
    ];
    hall.artworks = vec![
        painting(10, "Night Boat", "night_boat", "1930-1935", "ink-training", ""),
        painting(11, "Light Crimson Landscape", "light_crimson_landscape_45", "1935-1940", "ink-training", ""),
        painting(12, "Return from a Mountain Walk", "return_from_mountain_walk", "1940-1942", "ink-training", ""),
        painting(13, "Coloured Landscape", "coloured_landscape_135", "1942-1944", "huangshan", ""),
        painting(14, "Huilin Sketch", "huilin_sketch", "1944-1946", "huangshan", ""),
        painting(15, "Visiting a Friend by the Stream", "visiting_friend_by_stream", "1946-1948", "huangshan", ""),
        painting(16, "Huangshan Sketch", "huangshan_sketch", "1947-1948", "maturity", ""),
        painting(17, "River Journey", "river_journey", "1948", "maturity", ""),
    ];

    hall.info_panels = vec![
        panel(
            "period",
            "Middle: rich and lush",
            [
                "1930-1948",
                "The yellow period",
                "Accumulated, broken and soaked ink together; the signature tone takes shape.",
            ],
            Vec3::new(0.0, 5.0, -20.0),
            (8.0, 7.0),
        ),
        panel(
            "theory",
            "Five brushes, seven inks",
            [
                "1930-1940",
                "Theory",
                "Brush: flat, round, lingering, heavy, changing.\nInk: dense, pale, broken, splashed, layered, burnt, overnight.",
            ],
            Vec3::new(-6.0, 4.0, 0.0),
            (5.0, 6.0),
        ),
        panel(
            "huangshan",
            "Huangshan",
            [
                "1935-1948",
                "Landscape practice",
                "Repeated climbs of the Yellow Mountains fed a large body of work.",
            ],
            Vec3::new(6.0, 4.0, 0.0),
            (5.0, 6.0),
        ),
        panel(
            "maturity",
            "Rich and lush",
            [
                "1940-1948",
                "Mature style",
                "Moist, thick brushwork and boundless atmosphere.",
            ],
            Vec3::new(0.0, 5.0, 20.0),
            (8.0, 7.0),
        ),
    ];
    hall.entrance_markers = vec![
        marker("entrance", "Back to the entrance", Vec3::new(0.0, 0.0, -35.0)),
        marker("early", "To the early hall", Vec3::new(-5.0, 0.0, 35.0)),
        marker("late", "On to the late hall", Vec3::new(5.0, 0.0, 35.0)),
    ];
    hall
}

fn late() -> HallConfig {
    let mut hall = period_hall("late", "Late Hall", "Dark and dense: the black period").with_builder(
        AreaBuilderSpec::Panorama(FeaturePanelConfig {
            name: "final-work".into(),
            title: "Final works".into(),
            description: "The last works of the artist, the summit of his art".into(),
            position: Vec3::new(4.0, 3.0, 0.0),
            rotation_y: -PI / 2.0,
            width: 3.5,
            height: 2.5,
            panel_color: Color::from_hex(0x3d2817),
            frame_color: Color::from_hex(0xc9a227),
        }),
    );
    hall.materials = surfaces((0xe8e0d8, 0.7, 0.1), (0xd8d0c8, 0.4, 0.6), (0xe8e0d8, 0.8, 0.5));
    hall.lighting = period_lighting(0xfffff0, 0.6, 0xfff8e1, 3.0);

    hall.areas = vec![
        area("layered-ink", "Layered ink", "1948-1952", "Accumulated ink at its height", -30.0),
        area("burnt-ink", "Burnt and overnight ink", "1952-1955", "Breakthrough in technique", 0.0),
        area("sublimation", "Sublimation", "1955", "Painter and painting as one", 30.0),
    ];
    hall.artworks = vec![
        painting(20, "Landscape", "landscape", "1948-1950", "layered-ink", ""),
        painting(21, "Clearwater Bay Sketch", "clearwater_bay_sketch", "1950-1952", "layered-ink", ""),
        painting(22, "Light Crimson Landscape", "light_crimson_landscape_108", "1952-1953", "layered-ink", ""),
        painting(23, "Ink Landscape", "ink_landscape_92", "1953-1954", "burnt-ink", ""),
        painting(24, "Black Landscape", "black_landscape", "1954", "burnt-ink", ""),
        painting(25, "Overnight-Ink Landscape", "overnight_ink_landscape", "1954-1955", "burnt-ink", ""),
        painting(26, "Burnt-Ink Landscape", "burnt_ink_landscape", "1955", "sublimation", ""),
        painting(27, "Final Landscape", "final_landscape", "1955", "sublimation", ""),
    ];

    hall.info_panels = vec![
        panel(
            "period",
            "Late: dark and dense",
            [
                "1948-1955",
                "The black period",
                "Layer upon layer of dense, burnt and overnight ink, dark yet luminous.",
            ],
            Vec3::new(0.0, 5.0, -20.0),
            (8.0, 7.0),
        ),
        panel(
            "layered",
            "Layered ink",
            [
                "1948-1952",
                "Height of technique",
                "Ink stacked layer on layer until the surface is thick and translucent.",
            ],
            Vec3::new(-6.0, 4.0, 0.0),
            (5.0, 6.0),
        ),
        panel(
            "burnt",
            "Burnt and overnight ink",
            [
                "1952-1955",
                "Breakthrough",
                "Forceful yet airy effects from burnt and overnight ink.",
            ],
            Vec3::new(6.0, 4.0, 0.0),
            (5.0, 6.0),
        ),
        panel(
            "oneness",
            "Painter and painting as one",
            [
                "1955",
                "Summit",
                "Every stroke carries a lifetime of culture.",
            ],
            Vec3::new(0.0, 5.0, 20.0),
            (8.0, 7.0),
        ),
    ];
    hall.entrance_markers = vec![
        marker("entrance", "Back to the entrance", Vec3::new(0.0, 0.0, -35.0)),
        marker("middle", "Back to the middle hall", Vec3::new(-5.0, 0.0, 35.0)),
        marker("end", "On to the closing hall", Vec3::new(5.0, 0.0, 35.0)),
    ];
    hall
}

fn end() -> HallConfig {
    let mut hall = HallConfig::new("end", 48.0, 40.0, 10.0)
        .with_name("Closing Hall", "Achievements and legacy")
        .with_camera(Vec3::new(0.0, 3.0, 15.0), Vec3::new(0.0, 3.0, 0.0));
    hall.entrance_offset = Vec3::new(0.0, 0.0, 3.0);
    hall.materials = surfaces((0xf5f0e6, 0.7, 0.1), (0x3d2817, 0.6, 0.2), (0xfaf0e6, 0.8, 0.3));
    hall.lighting = vec![ambient(0xfff8e7, 0.5), directional(0xffffff, 0.8, Vec3::new(5.0, 10.0, 5.0))];
    hall.areas = vec![area(
        "central-memorial",
        "Central memorial",
        "1865-1955",
        "Summary of a life in art",
        0.0,
    )];

    let achievement = |title: &str, description: &str, position: Vec3, rotation_y: f32| AchievementConfig {
        title: title.into(),
        description: description.into(),
        position,
        rotation_y,
    };
    hall.builders = vec![AreaBuilderSpec::AchievementDisplays(vec![
        achievement(
            "Artistic achievement",
            "More than 5000 works over a lifetime",
            Vec3::new(-5.0, 4.0, -3.0),
            PI / 4.0,
        ),
        achievement("Honours", "Recognition of a master", Vec3::new(5.0, 4.0, -3.0), -PI / 4.0),
        achievement("Masterpieces", "A selection of representative works", Vec3::new(5.0, 4.0, 3.0), -PI / 4.0),
        achievement("1865-1955", "Ninety years of art", Vec3::new(-5.0, 4.0, 3.0), PI / 4.0),
        achievement("Timeline", "1865-1955\nA career in art", Vec3::new(-20.0, 4.0, 0.0), PI / 2.0),
        achievement(
            "Legacy",
            "Influence on later generations\nTeaching and scholarship",
            Vec3::new(20.0, 4.0, 0.0),
            -PI / 2.0,
        ),
        achievement("Thank you", "Thank you for visiting", Vec3::new(0.0, 3.0, 15.0), PI),
    ])];
    hall.entrance_markers = vec![
        marker("entrance", "Back to the entrance", Vec3::new(0.0, 0.0, -18.0)),
        marker("late", "Back to the late hall", Vec3::new(-15.0, 0.0, 18.0)),
    ];
    hall
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_valid() {
        for hall in builtin_halls() {
            hall.check().unwrap_or_else(|err| panic!("{}: {}", hall.id, err));
        }
        assert_eq!(builtin_halls().len(), HALL_IDS.len());
    }

    #[test]
    fn test_markers_point_at_known_halls() {
        for hall in builtin_halls() {
            for marker in &hall.entrance_markers {
                assert!(
                    builtin_hall(&marker.destination).is_some(),
                    "{} links to unknown hall {}",
                    hall.id,
                    marker.destination
                );
            }
        }
    }

    #[test]
    fn test_period_hall_dimensions() {
        let early = builtin_hall("early").expect("built in");
        assert_eq!((early.width, early.length, early.height), (16.0, 80.0, 12.0));
        assert_eq!(early.artworks.len(), 9);
        let end = builtin_hall("end").expect("built in");
        assert!(end.artworks.is_empty());
        assert_eq!((end.width, end.length), (48.0, 40.0));
    }

    #[test]
    fn test_digit_lookup() {
        assert_eq!(hall_for_digit(1), Some("entrance"));
        assert_eq!(hall_for_digit(5), Some("end"));
        assert_eq!(hall_for_digit(0), None);
        assert_eq!(hall_for_digit(6), None);
    }
}
