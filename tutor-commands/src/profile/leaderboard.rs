use tutor_store::model::user::User;

/// Position of one user among all students.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Standing {
    /// 1-based; 0 when the user is not a ranked student.
    pub rank: usize,
    pub students: usize,
}

impl Standing {
    pub fn is_ranked(&self) -> bool {
        self.rank > 0
    }
}

/// Students ordered by experience points, highest first. Equal points keep
/// their fetch order.
pub fn rank_students(users: &[User]) -> Vec<&User> {
    let mut students: Vec<&User> = users.iter().filter(|user| user.is_student()).collect();
    students.sort_by(|a, b| b.exp_points.cmp(&a.exp_points));
    students
}

pub fn standing_of(users: &[User], user_id: &str) -> Standing {
    let students = rank_students(users);
    let rank = students
        .iter()
        .position(|student| student.id == user_id)
        .map_or(0, |idx| idx + 1);

    Standing {
        rank,
        students: students.len(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tutor_store::model::user::User;

    use super::{rank_students, standing_of};

    fn user(id: &str, role: &str, points: u64) -> User {
        serde_json::from_value(json!({ "id": id, "role": role, "expPoints": points })).unwrap()
    }

    #[test]
    fn ties_keep_fetch_order() {
        let users = vec![
            user("u1", "Student", 50),
            user("u2", "Student", 80),
            user("u3", "Student", 50),
        ];

        let order: Vec<&str> = rank_students(&users).iter().map(|u| u.id.as_str()).collect();
        assert_eq!(order, ["u2", "u1", "u3"]);
        assert_eq!(standing_of(&users, "u1").rank, 2);
        assert_eq!(standing_of(&users, "u3").rank, 3);
    }

    #[test]
    fn non_students_are_excluded() {
        let users = vec![
            user("t1", "Teacher", 900),
            user("u1", "Student", 10),
            user("a1", "Admin", 500),
        ];

        let standing = standing_of(&users, "u1");
        assert_eq!(standing.rank, 1);
        assert_eq!(standing.students, 1);

        let teacher = standing_of(&users, "t1");
        assert_eq!(teacher.rank, 0);
        assert!(!teacher.is_ranked());
    }

    #[test]
    fn unknown_id_has_rank_zero() {
        assert_eq!(standing_of(&[], "nobody").rank, 0);
        assert_eq!(standing_of(&[user("u1", "Student", 1)], "nobody").rank, 0);
    }

    #[test]
    fn distinct_points_rank_by_count_of_higher_scores() {
        let points = [13_u64, 2, 400, 77, 0, 91, 5, 300];
        let users: Vec<User> = points
            .iter()
            .enumerate()
            .map(|(idx, points)| user(&format!("s{idx}"), "Student", *points))
            .collect();

        let ordered = rank_students(&users);
        assert!(ordered.windows(2).all(|w| w[0].exp_points > w[1].exp_points));

        for candidate in &users {
            let higher = users
                .iter()
                .filter(|other| other.exp_points > candidate.exp_points)
                .count();
            assert_eq!(standing_of(&users, &candidate.id).rank, higher + 1);
        }
    }
}
