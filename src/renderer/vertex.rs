use std::mem;

const R: [f32; 3] = [1.0, 0.0, 0.0];
const G: [f32; 3] = [0.0, 1.0, 0.0];
const B: [f32; 3] = [0.0, 0.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Vertex {
    pub a_pos: [f32; 3],
    pub a_color: [f32; 3],
}

impl Vertex {
    pub const POSITION_OFFSET: u32 = 0;
    pub const COLOR_OFFSET: u32 = mem::size_of::<[f32; 3]>() as u32;
    pub const STRIDE: u32 = mem::size_of::<Vertex>() as u32;
}

pub const TRIANGLE: [Vertex; 3] = [
    // bottom right
    Vertex {
        a_pos: [0.5, -0.5, 0.0],
        a_color: R,
    },
    // bottom left
    Vertex {
        a_pos: [-0.5, -0.5, 0.0],
        a_color: G,
    },
    // top
    Vertex {
        a_pos: [0.0, 0.5, 0.0],
        a_color: B,
    },
];

pub const INDICES: [u32; 3] = [0, 1, 2];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_is_three_vertices_of_six_floats() {
        assert_eq!(TRIANGLE.len(), 3);
        assert_eq!(mem::size_of_val(&TRIANGLE), 18 * mem::size_of::<f32>());
        assert_eq!(Vertex::STRIDE as usize, 6 * mem::size_of::<f32>());
    }

    #[test]
    fn color_follows_position() {
        assert_eq!(Vertex::POSITION_OFFSET, 0);
        assert_eq!(Vertex::COLOR_OFFSET as usize, 3 * mem::size_of::<f32>());
    }

    #[test]
    fn corner_colors() {
        assert_eq!(TRIANGLE[0].a_color, R);
        assert!(TRIANGLE[0].a_pos[0] > 0.0 && TRIANGLE[0].a_pos[1] < 0.0);
        assert_eq!(TRIANGLE[1].a_color, G);
        assert!(TRIANGLE[1].a_pos[0] < 0.0 && TRIANGLE[1].a_pos[1] < 0.0);
        assert_eq!(TRIANGLE[2].a_color, B);
        assert!(TRIANGLE[2].a_pos[1] > 0.0);
    }

    #[test]
    fn indices_describe_one_triangle() {
        assert_eq!(INDICES, [0, 1, 2]);
        assert!(INDICES.iter().all(|&i| (i as usize) < TRIANGLE.len()));
    }
}
