use approx::{assert_abs_diff_eq, assert_relative_eq};
use ct_plan::prelude::*;
use nalgebra::{Point3, Vector3};
use std::sync::Once;

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Debug)
            .init();
    });
}

/// 体数据中心放置一个 HU 为 1200 的 "骨块" (半径为 `r` 的立方体), 其余为软组织.
fn phantom(shape: Idx3d, r: usize) -> VoxelVolume {
    let (lz, ly, lx) = shape;
    let (cz, cy, cx) = (lz / 2, ly / 2, lx / 2);
    VoxelVolume::from_shape_fn(shape, |(z, y, x)| {
        if z.abs_diff(cz) <= r && y.abs_diff(cy) <= r && x.abs_diff(cx) <= r {
            1200
        } else {
            40
        }
    })
}

#[test]
fn uniform_bone_volume() {
    init_logger();
    let samples = vec![2000i16; 16 * 5 * 6];
    let v = VoxelVolume::from_raw_vec((16, 5, 6), samples).unwrap();

    let depth = v.depth_buffer(1000, &RenderConfig::default()).unwrap();
    assert!(depth.array_view().iter().all(|&d| d == 0));
    assert_eq!(depth.hit_count(), 30);

    assert_eq!(window(2000, 500, 1000), Ok(255));
    let sli = v.windowed_slice(0, &HuWindow::bone()).unwrap();
    assert!(sli.iter().all(|&g| g == 255));

    let shaded = depth.shade(&RenderConfig::default()).unwrap();
    assert_eq!(shaded[(2, 2)], 255);
    assert_eq!(shaded[(0, 0)], 0);
}

#[test]
fn segment_and_calibrate() {
    init_logger();
    let v = phantom((11, 21, 21), 3);
    let seed = (5, 10, 10);

    // 从正上方观察, 骨块顶面位于第 2 层.
    let depth = v.depth_buffer(DEFAULT_THRESHOLD, &RenderConfig::default()).unwrap();
    assert_eq!(depth[(10, 10)], 2);
    assert!(depth.is_background((0, 0)));

    let region = v.grow_region(seed, DEFAULT_THRESHOLD).unwrap();
    assert_eq!(region.member_count(), 7 * 7 * 7);
    let surface = region.surface_points().unwrap();
    assert_eq!(surface.len(), 7 * 7 * 7 - 5 * 5 * 5);

    let centroid = region.centroid().unwrap();
    assert_relative_eq!(centroid, Point3::new(10.0, 10.0, 5.0));

    // 图像空间中的标记点, 在跟踪设备坐标系中经过一次已知的刚体变换.
    let truth = RigidTransform::from_euler_about(0.2, -0.1, 0.7, &centroid)
        .then(&RigidTransform::new(
            nalgebra::Rotation3::identity(),
            Vector3::new(-30.0, 12.5, 4.0),
        ));
    let markers: Vec<_> = surface.iter().step_by(7).map(|&p| idx3d_to_point(p)).collect();
    let tracked: Vec<_> = markers.iter().map(|p| truth.apply(p)).collect();

    let tf = estimate(&markers, &tracked).unwrap();
    assert_abs_diff_eq!(tf.rms_error(&markers, &tracked).unwrap(), 0.0, epsilon = 1e-8);
    assert_relative_eq!(tf.to_homogeneous(), truth.to_homogeneous(), epsilon = 1e-8);

    // 绕质心旋转 180° 后重新投影, 骨块仍然覆盖同样的投影区域.
    let flip = RigidTransform::from_euler_about(std::f64::consts::PI, 0.0, 0.0, &centroid);
    let reprojected = DepthBuffer::from_points(
        surface.iter().copied(),
        &flip,
        v.slice_shape(),
        v.layers(),
        &RenderConfig::default(),
    )
    .unwrap();
    assert_eq!(reprojected.hit_count(), 7 * 7);
    assert_eq!(reprojected[(10, 10)], 2);

    let shaded = reprojected.shade(&RenderConfig::default()).unwrap();
    assert_eq!(shaded[(10, 10)], 255);
}

#[test]
fn window_errors_are_ordered() {
    assert_eq!(window(5000, 0, 0), Err(CalcError::HuOutOfRange(5000)));
    assert_eq!(window(0, 5000, 0), Err(CalcError::WidthOutOfRange(0)));
    assert_eq!(window(0, 5000, 100), Err(CalcError::CenterOutOfRange(5000)));
}
