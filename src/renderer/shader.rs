use gfx_hal::pso;
use std::fmt;
use std::io::{Cursor, Read};

/// Longest compiler or linker log carried in a report.
pub const INFO_LOG_LIMIT: usize = 512;

pub const VERTEX_SHADER_SOURCE: &str = r#"#version 450
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec3 aColor;
layout (location = 0) out vec3 vertexColor;
void main()
{
    gl_Position = vec4(aPos.x, -aPos.y, aPos.z, 1.0);
    vertexColor = aColor;
}
"#;

pub const FRAGMENT_SHADER_SOURCE: &str = r#"#version 450
layout (location = 0) in vec3 vertexColor;
layout (location = 0) out vec4 FragColor;
layout (push_constant) uniform Uniforms {
    vec4 ourColor;
};
void main()
{
    FragColor = vec4(mix(vertexColor, ourColor.rgb, 0.5), ourColor.a);
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn label(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VERTEX",
            ShaderStage::Fragment => "FRAGMENT",
        }
    }

    fn glsl_type(self) -> glsl_to_spirv::ShaderType {
        match self {
            ShaderStage::Vertex => glsl_to_spirv::ShaderType::Vertex,
            ShaderStage::Fragment => glsl_to_spirv::ShaderType::Fragment,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShaderError {
    Compile { stage: ShaderStage, log: String },
    Link { log: String },
}

impl ShaderError {
    pub fn compile(stage: ShaderStage, log: impl AsRef<str>) -> Self {
        ShaderError::Compile {
            stage,
            log: info_log(log.as_ref()),
        }
    }

    pub fn link(log: impl AsRef<str>) -> Self {
        ShaderError::Link {
            log: info_log(log.as_ref()),
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compile { stage, log } => write!(
                f,
                "ERROR::SHADER::{}::COMPILATION_FAILED\n{}",
                stage.label(),
                log
            ),
            ShaderError::Link { log } => {
                write!(f, "ERROR::SHADER::PROGRAM::LINKING_FAILED\n{}", log)
            }
        }
    }
}

impl std::error::Error for ShaderError {}

fn info_log(log: &str) -> String {
    log.chars().take(INFO_LOG_LIMIT).collect()
}

/// Compiles GLSL `source` for `stage` into SPIR-V words.
pub fn compile(stage: ShaderStage, source: &str) -> Result<Vec<u32>, ShaderError> {
    let mut file = glsl_to_spirv::compile(source, stage.glsl_type())
        .map_err(|log| ShaderError::compile(stage, log))?;
    let mut bytes = vec![];
    file.read_to_end(&mut bytes)
        .map_err(|e| ShaderError::compile(stage, e.to_string()))?;
    pso::read_spirv(Cursor::new(&bytes[..])).map_err(|e| ShaderError::compile(stage, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPIRV_MAGIC: u32 = 0x0723_0203;

    #[test]
    fn fixed_sources_compile() {
        let vs = compile(ShaderStage::Vertex, VERTEX_SHADER_SOURCE).unwrap();
        let fs = compile(ShaderStage::Fragment, FRAGMENT_SHADER_SOURCE).unwrap();
        assert_eq!(vs[0], SPIRV_MAGIC);
        assert_eq!(fs[0], SPIRV_MAGIC);
    }

    #[test]
    fn syntax_error_reports_vertex_compilation_failure() {
        let broken = VERTEX_SHADER_SOURCE.replace("vertexColor = aColor;", "vertexColor = ;");
        let err = compile(ShaderStage::Vertex, &broken).unwrap_err();
        let report = err.to_string();
        assert!(report.starts_with("ERROR::SHADER::VERTEX::COMPILATION_FAILED\n"));
        assert!(report.contains("ERROR::SHADER"));
    }

    #[test]
    fn fragment_failure_names_fragment_stage() {
        let err = ShaderError::compile(ShaderStage::Fragment, "0:1: bad token");
        assert_eq!(
            err.to_string(),
            "ERROR::SHADER::FRAGMENT::COMPILATION_FAILED\n0:1: bad token"
        );
    }

    #[test]
    fn link_report() {
        let err = ShaderError::link("interface mismatch");
        assert_eq!(
            err.to_string(),
            "ERROR::SHADER::PROGRAM::LINKING_FAILED\ninterface mismatch"
        );
    }

    #[test]
    fn log_is_bounded() {
        let long = "x".repeat(INFO_LOG_LIMIT * 2);
        match ShaderError::link(&long) {
            ShaderError::Link { log } => assert_eq!(log.len(), INFO_LOG_LIMIT),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn fragment_reads_our_color() {
        assert!(FRAGMENT_SHADER_SOURCE.contains("vec4 ourColor;"));
    }
}
