use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Categories::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Categories::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Categories::Slug)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Categories::Description).text().not_null())
                    .col(ColumnDef::new(Categories::Icon).string_len(50).not_null())
                    .col(ColumnDef::new(Categories::IsActive).boolean().not_null())
                    .col(
                        ColumnDef::new(Categories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Categories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Cours : prix en centimes, note moyenne en double
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Courses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Courses::Title).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Courses::Slug)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Courses::Description).text().not_null())
                    .col(
                        ColumnDef::new(Courses::ShortDescription)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Courses::InstructorId).uuid().not_null())
                    .col(ColumnDef::new(Courses::CategoryId).uuid())
                    .col(
                        ColumnDef::new(Courses::DifficultyLevel)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Courses::PriceCents).big_integer().not_null())
                    .col(ColumnDef::new(Courses::IsFree).boolean().not_null())
                    .col(ColumnDef::new(Courses::Thumbnail).string_len(500))
                    .col(ColumnDef::new(Courses::PreviewVideo).string_len(500).not_null())
                    .col(ColumnDef::new(Courses::DurationHours).integer().not_null())
                    .col(ColumnDef::new(Courses::Requirements).text().not_null())
                    .col(ColumnDef::new(Courses::LearningOutcomes).text().not_null())
                    .col(ColumnDef::new(Courses::TargetAudience).text().not_null())
                    .col(ColumnDef::new(Courses::WhoCanJoin).text().not_null())
                    .col(ColumnDef::new(Courses::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Courses::ReviewedBy).uuid())
                    .col(ColumnDef::new(Courses::ReviewNotes).text().not_null())
                    .col(ColumnDef::new(Courses::ReviewedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Courses::EnrollmentCount).integer().not_null())
                    .col(ColumnDef::new(Courses::AverageRating).double().not_null())
                    .col(ColumnDef::new(Courses::TotalReviews).integer().not_null())
                    .col(ColumnDef::new(Courses::TotalSeats).integer().not_null())
                    .col(ColumnDef::new(Courses::AvailableSeats).integer().not_null())
                    .col(ColumnDef::new(Courses::ClassStarts).date())
                    .col(ColumnDef::new(Courses::AdmissionDeadline).date())
                    .col(ColumnDef::new(Courses::Schedule).string_len(200).not_null())
                    .col(ColumnDef::new(Courses::Venue).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Courses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Courses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Courses::PublishedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_courses_instructor_id")
                            .from(Courses::Table, Courses::InstructorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_courses_category_id")
                            .from(Courses::Table, Courses::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_courses_reviewed_by")
                            .from(Courses::Table, Courses::ReviewedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_courses_status_is_free")
                    .table(Courses::Table)
                    .col(Courses::Status)
                    .col(Courses::IsFree)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_courses_instructor_status")
                    .table(Courses::Table)
                    .col(Courses::InstructorId)
                    .col(Courses::Status)
                    .to_owned(),
            )
            .await?;

        // Sections : ordre unique par cours
        manager
            .create_table(
                Table::create()
                    .table(CourseSections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseSections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CourseSections::CourseId).uuid().not_null())
                    .col(ColumnDef::new(CourseSections::Title).string_len(200).not_null())
                    .col(ColumnDef::new(CourseSections::Description).text().not_null())
                    .col(ColumnDef::new(CourseSections::Order).integer().not_null())
                    .col(
                        ColumnDef::new(CourseSections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CourseSections::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_sections_course_id")
                            .from(CourseSections::Table, CourseSections::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_course_sections_course_order")
                            .col(CourseSections::CourseId)
                            .col(CourseSections::Order)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Leçons : ordre unique par section
        manager
            .create_table(
                Table::create()
                    .table(Lessons::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lessons::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Lessons::SectionId).uuid().not_null())
                    .col(ColumnDef::new(Lessons::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Lessons::LessonType).string_len(20).not_null())
                    .col(ColumnDef::new(Lessons::Content).text().not_null())
                    .col(ColumnDef::new(Lessons::VideoUrl).string_len(500).not_null())
                    .col(ColumnDef::new(Lessons::VideoDuration).integer().not_null())
                    .col(ColumnDef::new(Lessons::Resources).string_len(500))
                    .col(ColumnDef::new(Lessons::IsPreview).boolean().not_null())
                    .col(ColumnDef::new(Lessons::Order).integer().not_null())
                    .col(
                        ColumnDef::new(Lessons::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Lessons::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lessons_section_id")
                            .from(Lessons::Table, Lessons::SectionId)
                            .to(CourseSections::Table, CourseSections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_lessons_section_order")
                            .col(Lessons::SectionId)
                            .col(Lessons::Order)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Avis : un seul par (cours, étudiant)
        manager
            .create_table(
                Table::create()
                    .table(CourseReviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseReviews::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CourseReviews::CourseId).uuid().not_null())
                    .col(ColumnDef::new(CourseReviews::StudentId).uuid().not_null())
                    .col(ColumnDef::new(CourseReviews::Rating).integer().not_null())
                    .col(ColumnDef::new(CourseReviews::ReviewText).text().not_null())
                    .col(
                        ColumnDef::new(CourseReviews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CourseReviews::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_reviews_course_id")
                            .from(CourseReviews::Table, CourseReviews::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_reviews_student_id")
                            .from(CourseReviews::Table, CourseReviews::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_course_reviews_course_student")
                            .col(CourseReviews::CourseId)
                            .col(CourseReviews::StudentId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CourseReviews::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Lessons::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(CourseSections::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Slug,
    Description,
    Icon,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    Title,
    Slug,
    Description,
    ShortDescription,
    InstructorId,
    CategoryId,
    DifficultyLevel,
    PriceCents,
    IsFree,
    Thumbnail,
    PreviewVideo,
    DurationHours,
    Requirements,
    LearningOutcomes,
    TargetAudience,
    WhoCanJoin,
    Status,
    ReviewedBy,
    ReviewNotes,
    ReviewedAt,
    EnrollmentCount,
    AverageRating,
    TotalReviews,
    TotalSeats,
    AvailableSeats,
    ClassStarts,
    AdmissionDeadline,
    Schedule,
    Venue,
    CreatedAt,
    UpdatedAt,
    PublishedAt,
}

#[derive(DeriveIden)]
enum CourseSections {
    Table,
    Id,
    CourseId,
    Title,
    Description,
    Order,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Lessons {
    Table,
    Id,
    SectionId,
    Title,
    LessonType,
    Content,
    VideoUrl,
    VideoDuration,
    Resources,
    IsPreview,
    Order,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CourseReviews {
    Table,
    Id,
    CourseId,
    StudentId,
    Rating,
    ReviewText,
    CreatedAt,
    UpdatedAt,
}
