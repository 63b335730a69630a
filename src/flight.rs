use cavern_geom::Vec3;

use crate::cave::Observer;

/// Deterministic fly-through: a slow climbing spiral per observer.
#[derive(Clone, Debug)]
pub struct FlightPath {
    start: Vec3,
    speed: f32,
    turn_rate: f32,
    phase: f32,
}

impl FlightPath {
    pub fn new(start: Vec3, speed: f32, turn_rate: f32, phase: f32) -> Self {
        Self {
            start,
            speed,
            turn_rate,
            phase,
        }
    }

    /// Spreads `count` observers along x, `spacing` apart, each with its own phase.
    pub fn fleet(count: usize, spacing: f32, speed: f32) -> Vec<FlightPath> {
        (0..count)
            .map(|i| {
                let i = i as f32;
                FlightPath::new(Vec3::new(i * spacing, 0.0, 0.0), speed, 0.15, i * 1.3)
            })
            .collect()
    }

    pub fn forward_at(&self, t: f32) -> Vec3 {
        let yaw = self.phase + t * self.turn_rate;
        let pitch = 0.2 * (t * 0.5 + self.phase).sin();
        Vec3::new(yaw.sin(), pitch, yaw.cos()).normalized()
    }

    /// Observer pose after `t` seconds of flight.
    pub fn observer_at(&self, t: f32) -> Observer {
        // closed-form integral of speed * (sin yaw, 0, cos yaw) with a bounded bob
        let w = self.turn_rate;
        let yaw0 = self.phase;
        let yaw = yaw0 + t * w;
        let (dx, dz) = if w.abs() < 1e-6 {
            (yaw0.sin() * t, yaw0.cos() * t)
        } else {
            ((yaw0.cos() - yaw.cos()) / w, (yaw.sin() - yaw0.sin()) / w)
        };
        let dy = 0.4 * (1.0 - (t * 0.5).cos());
        Observer {
            position: self.start + Vec3::new(dx, dy, dz) * self.speed,
            forward: self.forward_at(t),
        }
    }
}
