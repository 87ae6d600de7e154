//! Arcade physics bodies attached to sprites.

use serde::{Deserialize, Serialize};

/// Edges of an arcade body that take part in collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckCollision {
    pub none: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Default for CheckCollision {
    fn default() -> Self {
        Self {
            none: false,
            up: true,
            down: true,
            left: true,
            right: true,
        }
    }
}

/// Fields shared by every arcade body shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArcadeBody {
    pub offset_x: f64,
    pub offset_y: f64,
    pub mass: f64,
    pub moves: bool,
    pub immovable: bool,
    pub collide_world_bounds: bool,
    pub allow_rotation: bool,
    pub allow_gravity: bool,
    pub bounce_x: f64,
    pub bounce_y: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub max_velocity_x: f64,
    pub max_velocity_y: f64,
    pub acceleration_x: f64,
    pub acceleration_y: f64,
    pub drag_x: f64,
    pub drag_y: f64,
    pub gravity_x: f64,
    pub gravity_y: f64,
    pub friction_x: f64,
    pub friction_y: f64,
    pub angular_velocity: f64,
    pub angular_acceleration: f64,
    pub angular_drag: f64,
    pub max_angular: f64,
    pub check_collision: CheckCollision,
    pub skip_quad_tree: bool,
}

impl Default for ArcadeBody {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            mass: 1.0,
            moves: true,
            immovable: false,
            collide_world_bounds: false,
            allow_rotation: true,
            allow_gravity: true,
            bounce_x: 0.0,
            bounce_y: 0.0,
            velocity_x: 0.0,
            velocity_y: 0.0,
            max_velocity_x: 10000.0,
            max_velocity_y: 10000.0,
            acceleration_x: 0.0,
            acceleration_y: 0.0,
            drag_x: 0.0,
            drag_y: 0.0,
            gravity_x: 0.0,
            gravity_y: 0.0,
            friction_x: 1.0,
            friction_y: 0.0,
            angular_velocity: 0.0,
            angular_acceleration: 0.0,
            angular_drag: 0.0,
            max_angular: 1000.0,
            check_collision: CheckCollision::default(),
            skip_quad_tree: false,
        }
    }
}

/// Rectangular arcade body. A negative size means "use the frame size".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectArcadeBody {
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub arcade: ArcadeBody,
}

impl Default for RectArcadeBody {
    fn default() -> Self {
        Self {
            width: -1.0,
            height: -1.0,
            arcade: ArcadeBody::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleArcadeBody {
    pub radius: f64,
    #[serde(flatten)]
    pub arcade: ArcadeBody,
}

impl Default for CircleArcadeBody {
    fn default() -> Self {
        Self {
            radius: 16.0,
            arcade: ArcadeBody::default(),
        }
    }
}

/// Physics body of a sprite. A sprite without a body stores `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BodyModel {
    #[serde(rename = "arcadeRect")]
    RectArcade(RectArcadeBody),
    #[serde(rename = "arcadeCircle")]
    CircleArcade(CircleArcadeBody),
}

/// Shape of a body resolved against a frame, in the sprite's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
    },
}

impl BodyModel {
    pub fn arcade(&self) -> &ArcadeBody {
        match self {
            Self::RectArcade(body) => &body.arcade,
            Self::CircleArcade(body) => &body.arcade,
        }
    }

    pub fn arcade_mut(&mut self) -> &mut ArcadeBody {
        match self {
            Self::RectArcade(body) => &mut body.arcade,
            Self::CircleArcade(body) => &mut body.arcade,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RectArcade(_) => "arcadeRect",
            Self::CircleArcade(_) => "arcadeCircle",
        }
    }

    /// Resolves the body against a frame of `frame_width` x `frame_height`.
    pub fn shape(&self, frame_width: f64, frame_height: f64) -> BodyShape {
        let arcade = self.arcade();
        match self {
            Self::RectArcade(body) => BodyShape::Rect {
                x: arcade.offset_x,
                y: arcade.offset_y,
                width: if body.width < 0.0 {
                    frame_width
                } else {
                    body.width
                },
                height: if body.height < 0.0 {
                    frame_height
                } else {
                    body.height
                },
            },
            Self::CircleArcade(body) => BodyShape::Circle {
                x: arcade.offset_x,
                y: arcade.offset_y,
                radius: body.radius,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_tagged_and_flat() {
        let body = BodyModel::CircleArcade(CircleArcadeBody {
            radius: 8.0,
            ..Default::default()
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "arcadeCircle");
        assert_eq!(json["radius"], 8.0);
        assert_eq!(json["mass"], 1.0);
        assert_eq!(json["checkCollision"]["up"], true);
        let back: BodyModel = serde_json::from_value(json).unwrap();
        assert_eq!(back, body);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let body: BodyModel =
            serde_json::from_value(serde_json::json!({ "type": "arcadeRect", "immovable": true }))
                .unwrap();
        let BodyModel::RectArcade(rect) = &body else {
            panic!("expected rect body");
        };
        assert_eq!(rect.width, -1.0);
        assert!(rect.arcade.immovable);
        assert!(rect.arcade.moves);
    }

    #[test]
    fn rect_shape_falls_back_to_frame_size() {
        let body = BodyModel::RectArcade(RectArcadeBody::default());
        assert_eq!(
            body.shape(64.0, 32.0),
            BodyShape::Rect {
                x: 0.0,
                y: 0.0,
                width: 64.0,
                height: 32.0
            }
        );
    }
}
