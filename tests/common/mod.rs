// Shared fixtures for pipeline-check integration tests
#![allow(dead_code)]

use indoc::indoc;
use pipeline_check::{
    ImageGroup, PipelineDefinition, PipelineValidator, SpecificImage, ValidatedPipeline,
    ValidatorConfig,
};

/// A photo-admin `config.yaml` with unrelated sections the validator ignores.
pub const PHOTO_ADMIN_CONFIG: &str = indoc! {"
    photo_extensions: ['.dng', '.cr3', '.tiff', '.tif']
    metadata_extensions: ['.xmp']
    camera_mappings:
      AB3D:
        - name: Canon EOS R5
          serial_number: '12345'
    processing_methods:
      DxO_DeepPRIME_XD2s: DNG Conversion with DeepPRIME XD2s
      Edit: Photoshop Editing
      HDR: HDR Merge
    max_iterations_per_node: 5
    processing_pipelines:
      version: 1
      nodes:
        - id: capture
          type: Capture
          name: Camera Capture
          output: [raw_image_1, xmp_metadata_1]
        - id: raw_image_1
          type: File
          extension: .CR3
          name: Canon Raw File
          output: [selection_process]
        - id: xmp_metadata_1
          type: File
          extension: .XMP
          name: XMP Metadata
          output: []
        - id: selection_process
          type: Process
          method_ids: ['']
          name: Image Selection
          output: [dng_conversion]
        - id: dng_conversion
          type: Process
          method_ids: [DxO_DeepPRIME_XD2s]
          name: DNG Conversion
          output: [openformat_raw_image]
        - id: openformat_raw_image
          type: File
          extension: .DNG
          name: DNG File
          output: [termination_blackbox]
        - id: termination_blackbox
          type: Termination
          termination_type: Black Box Archive
          name: Black Box Archive Ready
          output: []
"};

/// Capture, raw, DNG conversion, DNG, Termination.
pub const RAW_TO_DNG: &str = indoc! {"
    version: 7
    nodes:
      - {id: capture, type: Capture, name: Camera, outputs: [raw]}
      - {id: raw, type: File, name: Raw, extension: .CR3, outputs: [dng_conversion]}
      - id: dng_conversion
        type: Process
        name: DNG Conversion
        method_ids: [DxO_DeepPRIME_XD2s]
        outputs: [dng]
      - {id: dng, type: File, name: DNG, extension: .DNG, outputs: [done]}
      - {id: done, type: Termination, name: Archive, termination_type: Black Box Archive}
"};

/// Editing loop: a Branching node feeds back into the edit step.
pub const EDIT_LOOP: &str = indoc! {"
    version: 2
    nodes:
      - {id: capture, type: Capture, name: Camera Capture, outputs: [raw_image]}
      - {id: raw_image, type: File, name: Canon Raw File, extension: .CR3, outputs: [edit_process]}
      - id: edit_process
        type: Process
        name: Photoshop Editing
        method_ids: [Edit]
        outputs: [branching_decision]
      - id: branching_decision
        type: Branching
        name: TIFF Generation Decision
        condition_description: 'User decides: Create TIFF or continue editing'
        outputs: [generate_tiff, edit_process]
      - {id: generate_tiff, type: Process, name: Generate TIFF, method_ids: [''], outputs: [tiff_file]}
      - {id: tiff_file, type: File, name: TIFF File, extension: .TIF, outputs: [termination]}
      - {id: termination, type: Termination, name: Archive Ready, termination_type: Black Box Archive}
"};

/// Two archival end states: raw-only and raw plus DNG plus TIFF.
pub const TWO_ARCHIVES: &str = indoc! {"
    version: 4
    nodes:
      - {id: capture, type: Capture, name: Camera, outputs: [raw]}
      - {id: raw, type: File, name: Raw, extension: .CR3, outputs: [decide]}
      - id: decide
        type: Branching
        name: Archive decision
        condition_description: keep raw only or develop
        outputs: [raw_archive, dng_conversion]
      - {id: dng_conversion, type: Process, name: DNG, method_ids: [DxO_DeepPRIME_XD2s], outputs: [dng]}
      - {id: dng, type: File, name: DNG, extension: .DNG, outputs: [edit]}
      - {id: edit, type: Process, name: Edit, method_ids: [Edit], outputs: [tif]}
      - {id: tif, type: File, name: TIFF, extension: .TIF, outputs: [xmp]}
      - {id: xmp, type: File, name: Sidecar, extension: .XMP, outputs: [developed_archive]}
      - {id: raw_archive, type: Termination, name: Raw archive, termination_type: Raw Archive}
      - id: developed_archive
        type: Termination
        name: Developed archive
        termination_type: Developed Archive
"};

pub fn config() -> ValidatorConfig {
    serde_yaml::from_str(PHOTO_ADMIN_CONFIG).expect("fixture config parses")
}

pub fn validator() -> PipelineValidator {
    PipelineValidator::new(config()).expect("fixture config is valid")
}

pub fn prepare(validator: &PipelineValidator, yaml: &str) -> ValidatedPipeline {
    let definition = PipelineDefinition::from_yaml_str(yaml).expect("fixture definition parses");
    validator
        .prepare(&definition)
        .expect("fixture definition validates")
}

/// The pipeline embedded in [`PHOTO_ADMIN_CONFIG`].
pub fn prepare_photo_admin(validator: &PipelineValidator) -> ValidatedPipeline {
    let definition = PipelineDefinition::from_config_yaml(PHOTO_ADMIN_CONFIG)
        .expect("fixture config has a pipeline section");
    validator
        .prepare(&definition)
        .expect("fixture definition validates")
}

/// An `AB3D` camera image.
pub fn image(counter: &str, suffix: &str, files: &[&str]) -> SpecificImage {
    SpecificImage::new("AB3D", counter, suffix, files.iter().copied())
}

/// Image groups from the pairing collaborator, as JSON.
pub const PAIRING_CACHE: &str = indoc! {r#"
    {
      "version": "1.0",
      "imagegroups": [
        {
          "group_id": "AB3D0001",
          "camera_id": "AB3D",
          "counter": "0001",
          "separate_images": {
            "": {
              "files": ["AB3D0001.CR3", "AB3D0001.XMP", "AB3D0001-DxO_DeepPRIME_XD2s.DNG"],
              "properties": []
            }
          }
        },
        {
          "group_id": "AB3D0002",
          "camera_id": "AB3D",
          "counter": "0002",
          "separate_images": {
            "": {"files": ["AB3D0002.CR3", "AB3D0002.XMP"], "properties": []}
          }
        },
        {
          "group_id": "AB3D0003",
          "camera_id": "AB3D",
          "counter": "0003",
          "separate_images": {
            "": {
              "files": [
                "AB3D0003.CR3",
                "AB3D0003.XMP",
                "AB3D0003-DxO_DeepPRIME_XD2s.DNG",
                "AB3D0003-backup.CR3"
              ],
              "properties": []
            },
            "2": {"files": ["AB3D0003-2.CR3"], "properties": []}
          }
        }
      ]
    }
"#};

pub fn image_groups() -> Vec<ImageGroup> {
    pipeline_check::images::parse_image_groups(PAIRING_CACHE).expect("fixture cache parses")
}

/// Route `log` output to the test harness; safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
