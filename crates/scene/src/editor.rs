//! Live editing of scene and camera parameters.
//!
//! [`ParamEditor`] keeps a cursor over every editable value: a parameter, a
//! component of it (x/y/z or r/g/b) and, for sphere parameters, which
//! sphere. Adjustments are made in steps sized per parameter and clamped to
//! the parameter's range.

use glam::Vec3;

use crate::camera::{FlyCamera, PITCH_LIMIT};
use crate::scene::Scene;

/// An editable value, scalar or three-component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Param {
    SunDirection,
    PointPosition,
    PointColor,
    PointIntensity,
    SpotPosition,
    SpotDirection,
    SpotColor,
    SpotIntensity,
    SpotCutOff,
    SpotOuterCutOff,
    SphereCenter,
    SphereRadius,
    SphereColor,
    SphereRoughness,
    CameraPosition,
    CameraYaw,
    CameraPitch,
}

impl Param {
    /// Every parameter in cursor order.
    pub const ALL: [Param; 17] = [
        Param::SunDirection,
        Param::PointPosition,
        Param::PointColor,
        Param::PointIntensity,
        Param::SpotPosition,
        Param::SpotDirection,
        Param::SpotColor,
        Param::SpotIntensity,
        Param::SpotCutOff,
        Param::SpotOuterCutOff,
        Param::SphereCenter,
        Param::SphereRadius,
        Param::SphereColor,
        Param::SphereRoughness,
        Param::CameraPosition,
        Param::CameraYaw,
        Param::CameraPitch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Param::SunDirection => "sun direction",
            Param::PointPosition => "point light position",
            Param::PointColor => "point light color",
            Param::PointIntensity => "point light intensity",
            Param::SpotPosition => "spot light position",
            Param::SpotDirection => "spot light direction",
            Param::SpotColor => "spot light color",
            Param::SpotIntensity => "spot light intensity",
            Param::SpotCutOff => "spot light cut-off",
            Param::SpotOuterCutOff => "spot light outer cut-off",
            Param::SphereCenter => "center",
            Param::SphereRadius => "radius",
            Param::SphereColor => "color",
            Param::SphereRoughness => "roughness",
            Param::CameraPosition => "camera position",
            Param::CameraYaw => "camera yaw",
            Param::CameraPitch => "camera pitch",
        }
    }

    /// 3 for vectors and colors, 1 for scalars.
    pub fn components(self) -> usize {
        match self {
            Param::SunDirection
            | Param::PointPosition
            | Param::PointColor
            | Param::SpotPosition
            | Param::SpotDirection
            | Param::SpotColor
            | Param::SphereCenter
            | Param::SphereColor
            | Param::CameraPosition => 3,
            _ => 1,
        }
    }

    pub fn is_color(self) -> bool {
        matches!(
            self,
            Param::PointColor | Param::SpotColor | Param::SphereColor
        )
    }

    pub fn is_sphere(self) -> bool {
        matches!(
            self,
            Param::SphereCenter | Param::SphereRadius | Param::SphereColor | Param::SphereRoughness
        )
    }

    /// Change per step.
    pub fn step(self) -> f32 {
        match self {
            Param::SunDirection
            | Param::SpotDirection
            | Param::SpotCutOff
            | Param::SpotOuterCutOff
            | Param::CameraYaw
            | Param::CameraPitch => 0.01,
            Param::PointColor | Param::SpotColor | Param::SphereColor | Param::SphereRoughness => {
                0.05
            }
            _ => 0.1,
        }
    }

    /// Inclusive bounds, or `None` when unbounded.
    pub fn range(self) -> Option<(f32, f32)> {
        match self {
            Param::SunDirection | Param::SpotDirection => Some((-1.0, 1.0)),
            Param::PointColor
            | Param::SpotColor
            | Param::SphereColor
            | Param::SpotCutOff
            | Param::SpotOuterCutOff
            | Param::SphereRoughness => Some((0.0, 1.0)),
            Param::PointIntensity | Param::SpotIntensity => Some((0.0, 100.0)),
            Param::SphereRadius => Some((0.01, f32::MAX)),
            Param::CameraPitch => Some((-PITCH_LIMIT, PITCH_LIMIT)),
            Param::PointPosition
            | Param::SpotPosition
            | Param::SphereCenter
            | Param::CameraPosition
            | Param::CameraYaw => None,
        }
    }
}

/// Cursor over the editable values of a [`Scene`] and a [`FlyCamera`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParamEditor {
    param: usize,
    component: usize,
    sphere: usize,
}

impl ParamEditor {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn param(&self) -> Param {
        Param::ALL[self.param]
    }

    /// Selected component, always below `param().components()`.
    #[inline]
    pub fn component(&self) -> usize {
        self.component
    }

    /// Sphere edited by sphere parameters.
    #[inline]
    pub fn sphere(&self) -> usize {
        self.sphere
    }

    pub fn next_param(&mut self) {
        self.param = (self.param + 1) % Param::ALL.len();
        self.component = 0;
    }

    pub fn prev_param(&mut self) {
        self.param = (self.param + Param::ALL.len() - 1) % Param::ALL.len();
        self.component = 0;
    }

    pub fn next_component(&mut self) {
        self.component = (self.component + 1) % self.param().components();
    }

    /// Moves the sphere cursor by `delta`, wrapping over the scene's spheres.
    pub fn select_sphere(&mut self, delta: isize, scene: &Scene) {
        let count = scene.sphere_count();
        if count == 0 {
            self.sphere = 0;
            return;
        }
        let current = self.sphere.min(count - 1) as isize;
        self.sphere = (current + delta).rem_euclid(count as isize) as usize;
    }

    /// Removes the selected sphere and keeps the cursor on a valid one.
    pub fn remove_selected(&mut self, scene: &mut Scene) -> bool {
        let removed = scene.remove_sphere(self.sphere).is_some();
        self.sphere = self.sphere.min(scene.sphere_count().saturating_sub(1));
        removed
    }

    /// Current value of the selected component, or `None` when the
    /// selected sphere does not exist.
    pub fn value(&self, scene: &Scene, camera: &FlyCamera) -> Option<f32> {
        let c = self.component;
        let sphere = scene.spheres.get(self.sphere);
        Some(match self.param() {
            Param::SunDirection => scene.sun.direction[c],
            Param::PointPosition => scene.point_light.position[c],
            Param::PointColor => scene.point_light.color[c],
            Param::PointIntensity => scene.point_light.intensity,
            Param::SpotPosition => scene.spot_light.position[c],
            Param::SpotDirection => scene.spot_light.direction[c],
            Param::SpotColor => scene.spot_light.color[c],
            Param::SpotIntensity => scene.spot_light.intensity,
            Param::SpotCutOff => scene.spot_light.cut_off,
            Param::SpotOuterCutOff => scene.spot_light.outer_cut_off,
            Param::SphereCenter => sphere?.center[c],
            Param::SphereRadius => sphere?.radius,
            Param::SphereColor => sphere?.color[c],
            Param::SphereRoughness => sphere?.roughness,
            Param::CameraPosition => camera.position[c],
            Param::CameraYaw => camera.yaw,
            Param::CameraPitch => camera.pitch,
        })
    }

    /// Adds `steps` steps to the selected component and returns the new
    /// value. Fractional steps are allowed.
    pub fn adjust(&self, scene: &mut Scene, camera: &mut FlyCamera, steps: f32) -> Option<f32> {
        let param = self.param();
        let field = self.field_mut(scene, camera)?;
        let mut value = *field + steps * param.step();
        if let Some((lo, hi)) = param.range() {
            value = value.clamp(lo, hi);
        }
        *field = value;
        Some(value)
    }

    /// Position of the value within its range, for bounded parameters.
    pub fn fraction(&self, scene: &Scene, camera: &FlyCamera) -> Option<f32> {
        let (lo, hi) = self.param().range().filter(|(_, hi)| *hi < f32::MAX)?;
        let value = self.value(scene, camera)?;
        Some(((value - lo) / (hi - lo)).clamp(0.0, 1.0))
    }

    /// The full color being edited, for color parameters.
    pub fn swatch(&self, scene: &Scene) -> Option<Vec3> {
        match self.param() {
            Param::PointColor => Some(scene.point_light.color),
            Param::SpotColor => Some(scene.spot_light.color),
            Param::SphereColor => scene.spheres.get(self.sphere).map(|s| s.color),
            _ => None,
        }
    }

    /// Human-readable cursor and value, e.g. `sphere 2 color.g = 0.40`.
    pub fn label(&self, scene: &Scene, camera: &FlyCamera) -> String {
        let param = self.param();
        let mut name = if param.is_sphere() {
            format!("sphere {} {}", self.sphere, param.name())
        } else {
            param.name().to_string()
        };
        if param.components() == 3 {
            let axes = if param.is_color() { ['r', 'g', 'b'] } else { ['x', 'y', 'z'] };
            name.push('.');
            name.push(axes[self.component]);
        }

        match self.value(scene, camera) {
            Some(value) => format!("{} = {:.2}", name, value),
            None => format!("{} (no sphere)", name),
        }
    }

    fn field_mut<'a>(
        &self,
        scene: &'a mut Scene,
        camera: &'a mut FlyCamera,
    ) -> Option<&'a mut f32> {
        let c = self.component;
        Some(match self.param() {
            Param::SunDirection => &mut scene.sun.direction[c],
            Param::PointPosition => &mut scene.point_light.position[c],
            Param::PointColor => &mut scene.point_light.color[c],
            Param::PointIntensity => &mut scene.point_light.intensity,
            Param::SpotPosition => &mut scene.spot_light.position[c],
            Param::SpotDirection => &mut scene.spot_light.direction[c],
            Param::SpotColor => &mut scene.spot_light.color[c],
            Param::SpotIntensity => &mut scene.spot_light.intensity,
            Param::SpotCutOff => &mut scene.spot_light.cut_off,
            Param::SpotOuterCutOff => &mut scene.spot_light.outer_cut_off,
            Param::SphereCenter => &mut scene.spheres.get_mut(self.sphere)?.center[c],
            Param::SphereRadius => &mut scene.spheres.get_mut(self.sphere)?.radius,
            Param::SphereColor => &mut scene.spheres.get_mut(self.sphere)?.color[c],
            Param::SphereRoughness => &mut scene.spheres.get_mut(self.sphere)?.roughness,
            Param::CameraPosition => &mut camera.position[c],
            Param::CameraYaw => &mut camera.yaw,
            Param::CameraPitch => &mut camera.pitch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn select(editor: &mut ParamEditor, param: Param) {
        while editor.param() != param {
            editor.next_param();
        }
    }

    #[test]
    fn test_param_cursor_wraps() {
        let mut editor = ParamEditor::new();
        assert_eq!(editor.param(), Param::SunDirection);
        editor.prev_param();
        assert_eq!(editor.param(), Param::CameraPitch);
        editor.next_param();
        assert_eq!(editor.param(), Param::SunDirection);
    }

    #[test]
    fn test_component_cycles_within_param() {
        let mut editor = ParamEditor::new();
        select(&mut editor, Param::PointColor);
        editor.next_component();
        editor.next_component();
        assert_eq!(editor.component(), 2);
        editor.next_component();
        assert_eq!(editor.component(), 0);

        select(&mut editor, Param::PointIntensity);
        editor.next_component();
        assert_eq!(editor.component(), 0);
    }

    #[test]
    fn test_adjust_point_light_color_component() {
        let mut scene = Scene::default();
        let mut camera = FlyCamera::default();
        let mut editor = ParamEditor::new();
        select(&mut editor, Param::PointColor);
        editor.next_component();

        let value = editor.adjust(&mut scene, &mut camera, -4.0).unwrap();
        assert_relative_eq!(value, 0.8, epsilon = 1e-6);
        assert_relative_eq!(scene.point_light.color.y, 0.8, epsilon = 1e-6);
        assert_relative_eq!(scene.point_light.color.x, 1.0);
    }

    #[test]
    fn test_adjust_clamps_to_range() {
        let mut scene = Scene::default();
        let mut camera = FlyCamera::default();
        let mut editor = ParamEditor::new();

        select(&mut editor, Param::SpotCutOff);
        assert_eq!(editor.adjust(&mut scene, &mut camera, 50.0), Some(1.0));

        select(&mut editor, Param::SphereRadius);
        let radius = editor.adjust(&mut scene, &mut camera, -100.0).unwrap();
        assert_relative_eq!(radius, 0.01);

        select(&mut editor, Param::CameraPitch);
        assert_eq!(
            editor.adjust(&mut scene, &mut camera, 1000.0),
            Some(PITCH_LIMIT)
        );
        assert_relative_eq!(camera.pitch, PITCH_LIMIT);
    }

    #[test]
    fn test_unbounded_params_move_freely() {
        let mut scene = Scene::default();
        let mut camera = FlyCamera::default();
        let mut editor = ParamEditor::new();
        select(&mut editor, Param::CameraPosition);
        editor.next_component();

        editor.adjust(&mut scene, &mut camera, 100.0);
        assert_relative_eq!(camera.position.y, 12.0, epsilon = 1e-4);
        assert_eq!(editor.fraction(&scene, &camera), None);
    }

    #[test]
    fn test_sphere_edits_follow_selection() {
        let mut scene = Scene::default();
        let mut camera = FlyCamera::default();
        let mut editor = ParamEditor::new();
        select(&mut editor, Param::SphereRoughness);

        editor.select_sphere(1, &scene);
        editor.adjust(&mut scene, &mut camera, 2.0);
        assert_relative_eq!(scene.spheres[1].roughness, 0.3, epsilon = 1e-6);
        assert_relative_eq!(scene.spheres[0].roughness, 0.5);

        editor.select_sphere(-2, &scene);
        assert_eq!(editor.sphere(), 3);
    }

    #[test]
    fn test_missing_sphere_is_not_edited() {
        let mut scene = Scene::empty();
        let mut camera = FlyCamera::default();
        let mut editor = ParamEditor::new();
        select(&mut editor, Param::SphereCenter);

        assert_eq!(editor.adjust(&mut scene, &mut camera, 1.0), None);
        assert_eq!(editor.label(&scene, &camera), "sphere 0 center.x (no sphere)");
    }

    #[test]
    fn test_remove_selected_keeps_cursor_valid() {
        let mut scene = Scene::default();
        let mut editor = ParamEditor::new();
        editor.select_sphere(-1, &scene);
        assert_eq!(editor.sphere(), 3);

        assert!(editor.remove_selected(&mut scene));
        assert_eq!(scene.sphere_count(), 3);
        assert_eq!(editor.sphere(), 2);
        // The floor was removed, the colored spheres remain.
        assert_relative_eq!(scene.spheres[2].radius, 1.0);
    }

    #[test]
    fn test_label_and_fraction() {
        let scene = Scene::default();
        let camera = FlyCamera::default();
        let mut editor = ParamEditor::new();
        select(&mut editor, Param::SphereColor);
        editor.select_sphere(1, &scene);
        editor.next_component();

        assert_eq!(editor.label(&scene, &camera), "sphere 1 color.g = 1.00");
        assert_eq!(editor.fraction(&scene, &camera), Some(1.0));
        assert_eq!(editor.swatch(&scene), Some(Vec3::new(0.0, 1.0, 0.0)));

        select(&mut editor, Param::SpotIntensity);
        assert_eq!(editor.label(&scene, &camera), "spot light intensity = 2.00");
        assert_relative_eq!(editor.fraction(&scene, &camera).unwrap(), 0.02);
        assert_eq!(editor.swatch(&scene), None);
    }
}
