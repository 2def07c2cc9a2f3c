//! Typed view of a student row.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub sex: String,
    pub age: Option<i32>,
    pub email: String,
    pub department_id: String,
}

impl Student {
    pub fn display_age(&self) -> String {
        match self.age {
            Some(age) => age.to_string(),
            None => "Unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_student() {
        let json = r#"{"id": "100001", "name": "钱多多", "sex": "女", "age": 20, "email": "qdd@example.com", "department_id": "01"}"#;
        let student: Student = serde_json::from_str(json).unwrap();
        assert_eq!(student.name, "钱多多");
        assert_eq!(student.display_age(), "20");
        assert_eq!(student.department_id, "01");
    }

    #[test]
    fn test_missing_fields_default() {
        let student: Student = serde_json::from_str(r#"{"id": "7"}"#).unwrap();
        assert_eq!(student.id, "7");
        assert!(student.email.is_empty());
        assert_eq!(student.display_age(), "Unknown");
    }
}
