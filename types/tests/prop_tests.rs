use proptest::prelude::*;

use facepass_types::{BoundingBox, FaceEmbedding, ModelVersion, EMBEDDING_DIM};

fn version() -> ModelVersion {
    ModelVersion::new("face-api.js/0.22.2")
}

fn descriptor() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0, EMBEDDING_DIM)
}

proptest! {
    /// distance(a, a) is exactly zero.
    #[test]
    fn distance_identity(values in descriptor()) {
        let e = FaceEmbedding::new(version(), values).unwrap();
        prop_assert_eq!(e.distance(&e).unwrap(), 0.0);
    }

    /// distance(a, b) == distance(b, a).
    #[test]
    fn distance_symmetric(a in descriptor(), b in descriptor()) {
        let a = FaceEmbedding::new(version(), a).unwrap();
        let b = FaceEmbedding::new(version(), b).unwrap();
        prop_assert_eq!(a.distance(&b).unwrap(), b.distance(&a).unwrap());
    }

    /// Triangle inequality, with slack for float rounding.
    #[test]
    fn distance_triangle(a in descriptor(), b in descriptor(), c in descriptor()) {
        let a = FaceEmbedding::new(version(), a).unwrap();
        let b = FaceEmbedding::new(version(), b).unwrap();
        let c = FaceEmbedding::new(version(), c).unwrap();
        let ab = a.distance(&b).unwrap();
        let bc = b.distance(&c).unwrap();
        let ac = a.distance(&c).unwrap();
        prop_assert!(ac <= ab + bc + 1e-9);
    }

    /// Area is never negative.
    #[test]
    fn area_non_negative(w in -100.0f64..100.0, h in -100.0f64..100.0) {
        prop_assert!(BoundingBox::new(0.0, 0.0, w, h).area() >= 0.0);
    }
}
