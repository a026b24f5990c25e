use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("malformed metadata block: {0}")]
    InvalidMetadata(#[from] serde_yaml::Error),

    #[error("`# BEGIN UNITTEST` block in exercise cell has no `class <Name>(unittest.TestCase)` declaration")]
    MissingUnitTestClass,

    #[error("`# BEGIN UNITTEST` without matching `# END UNITTEST`")]
    UnterminatedUnitTestBlock,

    #[error("`# BEGIN SOLUTION` without matching `# END SOLUTION`")]
    UnterminatedSolutionBlock,

    #[error("notebook has no `assignment_id` (neither in top-level metadata nor an ASSIGNMENT METADATA block)")]
    MissingAssignmentId,

    #[error("code cell uses autograder markup but no EXERCISE METADATA block has set an exercise id yet")]
    MissingExerciseId,

    #[error("io error writing asset tree: {0}")]
    Io(#[from] std::io::Error),
}
