use gridlight::data_structures::mesh::MeshDescription;

#[test]
fn should_parse_mesh_json() {
    let mesh = MeshDescription::from_json(
        r#"{
            "positions": [[0, 0, 0], [1, 0, 0], [0, 1, 0]],
            "cells": [[0, 1, 2]],
            "uv": [[0, 0], [1, 0], [0, 1]]
        }"#,
    )
    .unwrap();

    assert_eq!(mesh.indices(), vec![0, 1, 2]);
    assert_eq!(mesh.flat_positions(), vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    assert_eq!(mesh.flat_uv(), vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn should_zero_fill_missing_uv() {
    let mesh =
        MeshDescription::from_json(r#"{ "positions": [[0,0,0],[1,0,0],[0,1,0]], "cells": [[0,1,2]] }"#)
            .unwrap();
    assert!(mesh.uv.is_empty());
    assert_eq!(mesh.flat_uv(), vec![0.0; 6]);
}

#[test]
fn should_reject_cells_past_the_vertices() {
    let err = MeshDescription::from_json(r#"{ "positions": [[0,0,0],[1,0,0]], "cells": [[0,1,2]] }"#)
        .unwrap_err();
    assert!(err.to_string().contains("indexes past"), "{err}");
}

#[test]
fn should_reject_partial_uv_channels() {
    let err = MeshDescription::from_json(
        r#"{ "positions": [[0,0,0],[1,0,0],[0,1,0]], "cells": [[0,1,2]], "uv": [[0,0]] }"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("uv"), "{err}");
}

#[test]
fn should_reject_malformed_json() {
    assert!(MeshDescription::from_json(r#"{ "positions": 3 }"#).is_err());
    assert!(MeshDescription::from_json(r#"{ "positions": [], "cells": [] }"#).is_err());
}
